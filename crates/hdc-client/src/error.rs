/*!
 * Error types for HDC client operations.
 */
use std::io;

use thiserror::Error;

/// Result type alias for HDC operations
pub type Result<T> = std::result::Result<T, HdcError>;

/// Errors that can occur during HDC operations
#[derive(Error, Debug)]
pub enum HdcError {
    /// I/O error occurred during communication
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid protocol data received
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Handshake failed
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// Connection not established
    #[error("Not connected to HDC server")]
    NotConnected,

    /// Invalid banner received
    #[error("Invalid banner: expected 'OHOS HDC', got {0:?}")]
    InvalidBanner(Vec<u8>),

    /// Buffer size error
    #[error("Buffer error: {0}")]
    BufferError(String),

    /// The server reported a failure for the command
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Timeout occurred
    #[error("Operation timed out")]
    Timeout,

    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A local or remote path was rejected before sending
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// A caller-supplied argument was rejected before sending
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// UTF-8 conversion error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Error from the core crate (configuration, runtime)
    #[error(transparent)]
    Core(hdc_core::error::Error),
}

impl HdcError {
    /// Create a new protocol error
    pub fn protocol<S: AsRef<str>>(msg: S) -> Self {
        HdcError::Protocol(msg.as_ref().to_string())
    }

    /// Create a new command failure
    pub fn command_failed<S: AsRef<str>>(msg: S) -> Self {
        HdcError::CommandFailed(msg.as_ref().to_string())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: AsRef<str>>(msg: S) -> Self {
        HdcError::InvalidArgument(msg.as_ref().to_string())
    }
}

impl From<hdc_core::error::Error> for HdcError {
    fn from(err: hdc_core::error::Error) -> Self {
        match err {
            hdc_core::error::Error::Timeout(_) => HdcError::Timeout,
            hdc_core::error::Error::Io(e) => HdcError::Io(e),
            other => HdcError::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_server_text() {
        let err = HdcError::command_failed("[Fail]TaskId not found");
        assert_eq!(err.to_string(), "Command failed: [Fail]TaskId not found");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: HdcError = hdc_core::error::Error::config("bad address").into();
        assert_eq!(err.to_string(), "Configuration error: bad address");
    }

    #[test]
    fn test_core_timeout_maps_to_timeout() {
        let err: HdcError = hdc_core::error::Error::timeout("connect").into();
        assert!(matches!(err, HdcError::Timeout));
    }
}
