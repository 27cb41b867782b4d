//! Datagram transport layer for Gabble.
//!
//! Provides the [`DatagramSocket`] trait: the only thing the chat server and
//! client need from the network. Bind once, then send and receive whole
//! datagrams addressed by [`PeerAddr`]. Delivery is best-effort; nothing in
//! this crate retries or acknowledges.

mod error;
mod udp;

pub use error::TransportError;
pub use udp::UdpTransport;

use std::fmt;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};

/// Network address of a datagram peer (IP and port).
///
/// UDP has no connection object, so this is the only identity a datagram
/// carries. Comparisons are explicit: [`same_endpoint`](Self::same_endpoint)
/// checks IP and port, [`same_host`](Self::same_host) checks IP only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerAddr(SocketAddr);

impl PeerAddr {
    /// Wraps a socket address.
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// Returns the underlying socket address.
    pub fn socket_addr(self) -> SocketAddr {
        self.0
    }

    /// Returns the IP part of the address.
    pub fn ip(self) -> IpAddr {
        self.0.ip()
    }

    /// Returns the port part of the address.
    pub fn port(self) -> u16 {
        self.0.port()
    }

    /// `true` if both addresses have the same IP, regardless of port.
    pub fn same_host(self, other: PeerAddr) -> bool {
        self.ip() == other.ip()
    }

    /// `true` if both addresses have the same IP and the same port.
    pub fn same_endpoint(self, other: PeerAddr) -> bool {
        self.same_host(other) && self.port() == other.port()
    }
}

impl From<SocketAddr> for PeerAddr {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bound datagram socket.
///
/// The returned futures are `Send` so a socket shared through an `Arc` can
/// be driven from a spawned task (the client's receiver does this).
pub trait DatagramSocket: Send + Sync + 'static {
    /// Sends one datagram to `target`.
    ///
    /// Succeeds only if the whole buffer was handed to the OS; a partial
    /// send is reported as [`TransportError::ShortSend`].
    fn send_to(
        &self,
        data: &[u8],
        target: PeerAddr,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next datagram, copying it into `buf`.
    ///
    /// Returns the datagram length and its source. A datagram larger than
    /// `buf` is truncated by the OS, so callers that must detect oversize
    /// datagrams pass a buffer one byte larger than the expected size.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, PeerAddr), TransportError>> + Send;

    /// Returns the address this socket is bound to.
    fn local_addr(&self) -> Result<PeerAddr, TransportError>;
}
