//! Server-level errors.

use thiserror::Error;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// An I/O error occurred while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ServerError::Bind("address in use".to_string());
        assert_eq!(err.to_string(), "bind error: address in use");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "broken pipe");
        let err: ServerError = io.into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
