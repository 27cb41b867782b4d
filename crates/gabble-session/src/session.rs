//! The session value type.

use gabble_transport::PeerAddr;

/// One online user: who they are and where their datagrams come from.
///
/// The username is the key. The address is only used to route replies and
/// to attribute incoming datagrams that do not name their sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub username: String,
    pub addr: PeerAddr,
}

impl Session {
    pub fn new(username: impl Into<String>, addr: PeerAddr) -> Self {
        Self {
            username: username.into(),
            addr,
        }
    }

    /// `true` if this session was joined from exactly `addr` (IP and port).
    pub fn is_at(&self, addr: PeerAddr) -> bool {
        self.addr.same_endpoint(addr)
    }
}
