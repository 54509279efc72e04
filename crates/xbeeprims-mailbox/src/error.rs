use std::time::Duration;

/// Errors that can occur in mailbox operations.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// Frame-level error raised by the reader or writer task.
    #[error("frame error: {0}")]
    Frame(#[from] xbeeprims_frame::FrameError),

    /// Transport setup failed (cloning, timeouts, thread spawn).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The queue's task has stopped.
    #[error("mailbox closed")]
    Closed,

    /// The outbox has no room for another frame right now.
    #[error("outbox full")]
    Full,

    /// No frame arrived in time.
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),

    /// The configuration cannot be applied.
    #[error("invalid mailbox config: {0}")]
    InvalidConfig(&'static str),

    /// A reader or writer task panicked.
    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, MailboxError>;
