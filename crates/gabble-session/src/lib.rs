//! Online user tracking for Gabble.
//!
//! UDP has no connections, so the server keeps its own record of who is
//! online and where to reach them: the [`SessionDirectory`], a map from
//! username to [`PeerAddr`](gabble_transport::PeerAddr).
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)  ← looks up senders and recipients on every datagram
//!     ↕
//! Session Layer (this crate)  ← username ↔ address
//!     ↕
//! Transport (below)  ← provides PeerAddr
//! ```

mod directory;
mod error;
mod session;

pub use directory::SessionDirectory;
pub use error::SessionError;
pub use session::Session;
