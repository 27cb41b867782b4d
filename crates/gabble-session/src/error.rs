//! Error types for the session layer.

use gabble_transport::PeerAddr;

/// Errors that can occur while updating or querying the directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A session with this username already exists.
    #[error("user {0} is already online")]
    AlreadyOnline(String),

    /// The username is empty or does not fit the wire field.
    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    /// No session exists for this username.
    #[error("user {0} is not online")]
    UnknownUser(String),

    /// No session was joined from this address.
    #[error("no user is online at {0}")]
    UnknownAddress(PeerAddr),
}
