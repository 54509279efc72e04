use std::time::Duration;

use xbeeprims_frame::DecodeStats;

use crate::error::{MailboxError, Result};

/// Mailbox queue sizes and timing.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    /// Frames buffered between the reader task and the application.
    pub inbox_capacity: usize,
    /// Frames buffered between the application and the writer task.
    pub outbox_capacity: usize,
    /// Upper bound on how long a task waits before re-checking for shutdown.
    /// Applied as the transport read timeout by [`crate::Mailbox::spawn`].
    pub poll_interval: Duration,
    /// Write timeout applied to the transport. `None` blocks forever.
    pub write_timeout: Option<Duration>,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 64,
            outbox_capacity: 64,
            poll_interval: Duration::from_millis(100),
            write_timeout: None,
        }
    }
}

impl MailboxConfig {
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(MailboxError::InvalidConfig("poll_interval must be non-zero"));
        }
        // Async channels cannot be zero-sized.
        if self.inbox_capacity == 0 || self.outbox_capacity == 0 {
            return Err(MailboxError::InvalidConfig("queue capacity must be non-zero"));
        }
        if matches!(self.write_timeout, Some(t) if t.is_zero()) {
            return Err(MailboxError::InvalidConfig("write_timeout must be non-zero"));
        }
        Ok(())
    }
}

/// What the reader and writer tasks did before they stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxReport {
    /// Decoder counters from the reader task.
    pub decode: DecodeStats,
    /// Frames fully written by the writer task.
    pub frames_written: u64,
}
