//! Inbox/outbox queues over an XBee API frame transport.
//!
//! A reader task decodes frames off the transport into the inbox while a
//! writer task drains the outbox onto it, so the application never blocks
//! on the radio link directly.

#[cfg(feature = "async")]
pub mod async_mailbox;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod transport;

#[cfg(feature = "async")]
pub use async_mailbox::AsyncMailbox;
pub use config::{MailboxConfig, MailboxReport};
pub use error::{MailboxError, Result};
pub use mailbox::Mailbox;
pub use transport::DuplexTransport;
