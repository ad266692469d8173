//! Error types for filexfer

/// Unified error type for filexfer operations that sit above the wire codec
#[derive(Debug, thiserror::Error)]
pub enum FilexferError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Other error
    #[error("Error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl FilexferError {
    /// Returns true if this error wraps an I/O error of the given kind.
    pub fn is_io_kind(&self, kind: std::io::ErrorKind) -> bool {
        matches!(self, FilexferError::Io(e) if e.kind() == kind)
    }
}

/// Result type for filexfer operations
pub type FilexferResult<T> = Result<T, FilexferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FilexferError::Config("max_packet_length must be non-zero".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: max_packet_length must be non-zero"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "peer went away");
        let err: FilexferError = io_err.into();
        assert!(matches!(err, FilexferError::Io(_)));
        assert!(err.is_io_kind(std::io::ErrorKind::UnexpectedEof));
        assert!(!err.is_io_kind(std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;

        let err: FilexferError =
            std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(err.source().is_some());

        let err = FilexferError::Protocol("bad frame".into());
        assert!(err.source().is_none());
    }
}
