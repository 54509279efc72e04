use std::fmt;
use std::io;

use xbeeprims_frame::FrameError;

// Process exit codes: 60 for bad frame data, 64 for bad arguments (sysexits EX_USAGE).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied | io::ErrorKind::BrokenPipe => {
            FAILURE
        }
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::FrameTooLarge { .. }
        | FrameError::EmptyFrameData
        | FrameError::Truncated { .. }
        | FrameError::ChecksumMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn usage(message: impl Into<String>) -> CliError {
    CliError::new(USAGE, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_map_to_exit_codes() {
        let too_large = FrameError::FrameTooLarge {
            size: 70_000,
            max: 65_535,
        };
        assert_eq!(frame_error("encode", too_large).code, DATA_INVALID);
        assert_eq!(
            frame_error("read", FrameError::ConnectionClosed).code,
            FAILURE
        );

        let io = FrameError::Io(io::Error::from(io::ErrorKind::NotFound));
        let err = frame_error("open", io);
        assert_eq!(err.code, FAILURE);
        assert!(err.message.starts_with("open: "));
    }

    #[test]
    fn unexpected_io_is_internal() {
        let err = io_error("read", io::Error::other("boom"));
        assert_eq!(err.code, INTERNAL);
    }
}
