//! Wire protocol for Gabble.
//!
//! This crate defines what clients and servers say to each other:
//!
//! - **Types** ([`ChatMessage`], [`MessageKind`], [`ErrorCode`],
//!   [`FixedStr`]): the fixed-size record that travels in every datagram.
//! - **Codec** ([`ChatMessage::encode`], [`ChatMessage::decode`]): the
//!   byte layout of that record.
//! - **Factory** ([`ChatMessage::join`], [`ChatMessage::broadcast`], ...):
//!   one constructor per command kind.
//! - **Roster** ([`roster::paginate`], [`roster::parse_page`]): packing the
//!   online user list into LIST records and reading it back.
//!
//! # Architecture
//!
//! ```text
//! Transport (datagrams) → Protocol (ChatMessage) → Engine / Client
//! ```
//!
//! Nothing here touches sockets or holds state.

mod codec;
mod error;
mod factory;
pub mod roster;
mod types;

pub use error::ProtocolError;
pub use roster::RosterPage;
pub use types::{
    ALL_USERS, ChatMessage, ErrorCode, FixedStr, GROUPNAME_LEN, LIST_END, MESSAGE_LEN,
    MessageKind, SERVER_PORT, SERVER_USERNAME, USERNAME_LEN, WIRE_SIZE,
};
