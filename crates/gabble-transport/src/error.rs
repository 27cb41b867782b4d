use std::net::SocketAddr;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the local socket failed.
    #[error("bind to {addr} failed: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Sending a datagram failed.
    #[error("send to {target} failed: {source}")]
    SendFailed {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The OS accepted fewer bytes than the datagram holds.
    #[error("short send to {target}: {sent} of {expected} bytes")]
    ShortSend {
        target: SocketAddr,
        sent: usize,
        expected: usize,
    },

    /// Receiving a datagram failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Querying the bound address failed.
    #[error("local address unavailable: {0}")]
    LocalAddr(#[source] std::io::Error),
}
