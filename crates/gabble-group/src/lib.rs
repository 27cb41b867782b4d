//! Chat groups for Gabble.
//!
//! A group is a name plus an ordered member list. Each user belongs to at
//! most one group at a time; the [`GroupDirectory`] keeps a reverse index
//! from username to group and holds it in sync with every member list.
//!
//! Groups are never deleted while the server runs. The whole directory is
//! reset on shutdown.

mod directory;
mod error;

pub use directory::GroupDirectory;
pub use error::GroupError;
