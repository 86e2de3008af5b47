//! Transport error types.

use thiserror::Error;

use crate::error::ProtocolError;

/// Failures that end a connection.
///
/// Kept apart from [`ProtocolError`]: a malformed frame is dropped, a
/// transport error tears the connection down.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Read, write or connect failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The codec rejected an outgoing frame.
    #[error("transport protocol error: {0}")]
    Protocol(ProtocolError),

    /// The host is not usable as a TLS server name.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),
}

impl From<ProtocolError> for TransportError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(io) => Self::Io(io),
            other => Self::Protocol(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_inside_protocol_error_is_lifted() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: TransportError = ProtocolError::Io(io).into();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(err.to_string(), "transport I/O error: broken pipe");
    }

    #[test]
    fn codec_errors_stay_protocol() {
        let err: TransportError = ProtocolError::MessageTooLong {
            actual: 10,
            limit: 5,
        }
        .into();
        assert!(matches!(err, TransportError::Protocol(_)));
        assert!(err.to_string().contains("message too long"));
    }

    #[test]
    fn error_source_chaining() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = TransportError::from(io);
        let source = std::error::Error::source(&err);
        assert_eq!(source.map(|s| s.to_string()).as_deref(), Some("timed out"));
    }
}
