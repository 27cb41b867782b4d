//! Unified error type for Gabble.

use gabble_protocol::{ErrorCode, MessageKind};
use gabble_transport::TransportError;

/// Top-level error for running a server or client.
///
/// Only socket failures propagate from the lower layers. Malformed
/// datagrams are dropped where they arrive, and server-side request
/// failures are answered with ERROR datagrams instead.
#[derive(Debug, thiserror::Error)]
pub enum GabbleError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered JOIN with something other than JACK.
    #[error("join rejected: server replied {kind}{}", code_suffix(.code))]
    Rejected {
        kind: MessageKind,
        code: Option<ErrorCode>,
    },

    /// No reply to JOIN arrived within the configured timeout.
    #[error("no reply to join within the timeout")]
    JoinTimedOut,

    /// A configured address could not be parsed.
    #[error("invalid address {addr:?}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

fn code_suffix(code: &Option<ErrorCode>) -> String {
    code.map(|code| format!(" ({code})")).unwrap_or_default()
}
