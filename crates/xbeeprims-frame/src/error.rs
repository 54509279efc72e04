/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Frame data must carry at least the type tag.
    #[error("empty frame data (missing frame type tag)")]
    EmptyFrameData,

    /// Frame data is shorter than the fixed fields of its frame type.
    #[error("truncated frame data for type 0x{frame_type:02X} ({actual} bytes, need {needed})")]
    Truncated {
        frame_type: u8,
        needed: usize,
        actual: usize,
    },

    /// The received checksum does not match the frame data.
    #[error("checksum mismatch (expected 0x{expected:02X}, received 0x{received:02X})")]
    ChecksumMismatch { expected: u8, received: u8 },

    /// The frame data does not fit the 16-bit length field.
    #[error("frame data too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport reached end of stream.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors caused by checksum-valid but semantically malformed frame data.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::EmptyFrameData | Self::Truncated { .. })
    }

    /// True when the error is a transport timeout the caller may retry after.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(err) if matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
