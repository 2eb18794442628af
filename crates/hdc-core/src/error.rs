/*!
 * Error types for the HDC core crate.
 */
use thiserror::Error;

/// Error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config<S: AsRef<str>>(msg: S) -> Self {
        Error::Config(msg.as_ref().to_string())
    }

    /// Create a new runtime error
    pub fn runtime<S: AsRef<str>>(msg: S) -> Self {
        Error::Runtime(msg.as_ref().to_string())
    }

    /// Create a new timeout error
    pub fn timeout<S: AsRef<str>>(msg: S) -> Self {
        Error::Timeout(msg.as_ref().to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::config("missing address").to_string(),
            "Configuration error: missing address"
        );
        assert_eq!(Error::timeout("connect").to_string(), "Timeout: connect");
    }

    #[test]
    fn test_from_io() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
