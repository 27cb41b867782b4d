//! Error types for the group layer.

/// Errors that can occur during group operations.
///
/// Every failure leaves the directory unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    /// A group with this name is already registered.
    #[error("group {0} already exists")]
    AlreadyExists(String),

    /// No group with this name is registered.
    #[error("group {0} not found")]
    NotFound(String),

    /// The user is already a member of this group.
    #[error("user {user} is already in group {group}")]
    AlreadyMember { user: String, group: String },

    /// The user is not a member of this group.
    #[error("user {user} is not in group {group}")]
    NotMember { user: String, group: String },
}
