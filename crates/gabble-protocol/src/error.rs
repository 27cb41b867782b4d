//! Error types for the protocol layer.
//!
//! Every variant describes a datagram that cannot be turned into a
//! [`ChatMessage`](crate::ChatMessage). Receivers log these and drop the
//! datagram; none of them is ever answered on the wire.

/// Errors that can occur while decoding a wire record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The datagram is not exactly one record long.
    #[error("invalid datagram length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The kind byte is outside the known enumeration.
    #[error("unknown message kind {0}")]
    UnknownKind(u8),

    /// A text field has no NUL terminator inside its bound.
    #[error("{0} field is not NUL-terminated")]
    UnterminatedField(&'static str),

    /// An ERROR record carries a code outside the known set.
    #[error("unknown error code {0}")]
    UnknownErrorCode(u16),
}
