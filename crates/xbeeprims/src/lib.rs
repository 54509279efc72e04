//! XBee API frames over byte streams.
//!
//! # Crate Structure
//!
//! - [`frame`]: frame model, envelope codec and blocking stream I/O
//! - [`mailbox`]: inbox/outbox queues over a duplex transport (behind `mailbox` feature)

/// Re-export frame types.
pub mod frame {
    pub use xbeeprims_frame::*;
}

/// Re-export mailbox types (requires `mailbox` feature).
#[cfg(feature = "mailbox")]
pub mod mailbox {
    pub use xbeeprims_mailbox::*;
}
