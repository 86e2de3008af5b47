//! Error types for the IRC protocol library.
//!
//! Codec failures are [`ProtocolError`]s: they condemn a single frame, never
//! the connection carrying it. Transport failures live in
//! [`crate::transport::TransportError`].

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error surfaced through a codec.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The verb is missing, is not a known command, or is a numeric with no
    /// reply-table entry. Carries the offending token (empty when absent).
    #[error("malformed command: {0:?}")]
    MalformedCommand(String),

    /// The frame could not be decoded with the message encoding.
    #[error("frame is not valid {encoding}")]
    InvalidEncoding {
        /// Name of the encoding that rejected the bytes.
        encoding: &'static str,
    },

    /// No encoding is known under the given label.
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// Message exceeded maximum allowed length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Bytes buffered without a line terminator.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },
}

impl ProtocolError {
    /// The verb or numeric that caused a [`ProtocolError::MalformedCommand`].
    pub fn offending_token(&self) -> Option<&str> {
        match self {
            Self::MalformedCommand(token) => Some(token),
            _ => None,
        }
    }
}

/// A `nick!user@host` string that could not be split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid user address: {0:?}")]
pub struct InvalidAddress(pub String);
