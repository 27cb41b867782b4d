//! # Gabble
//!
//! Multi-user chat over UDP.
//!
//! A server tracks who is online and which groups exist, and routes
//! messages between clients. Every datagram is one fixed-size record (see
//! [`gabble_protocol`]); identity is the sender's address, since UDP has no
//! connections.
//!
//! - [`ChatEngine`]: the server's state machine. Pure, one request in,
//!   a list of datagrams out.
//! - [`ChatServer`]: binds a socket and runs the engine.
//! - [`ClientSession`]: the client's state machine.
//! - [`ChatClient`]: joins a server and runs a session over a socket.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gabble::prelude::*;
//!
//! # async fn demo() -> Result<(), GabbleError> {
//! let server = ChatServer::builder().bind("127.0.0.1:8867").build().await?;
//! server.run().await
//! # }
//! ```

mod backoff;
mod client;
mod command;
mod config;
mod engine;
mod error;
pub mod logging;
mod server;

pub use client::{ChatClient, ClientSession, ClientState, DisplayEvent};
pub use command::Command;
pub use config::{ClientConfig, ServerConfig};
pub use engine::{ChatEngine, Outbound};
pub use error::GabbleError;
pub use server::{ChatServer, ChatServerBuilder};

pub use gabble_group as group;
pub use gabble_protocol as protocol;
pub use gabble_session as session;
pub use gabble_transport as transport;

/// The types most programs need.
pub mod prelude {
    pub use crate::{
        ChatClient, ChatEngine, ChatServer, ChatServerBuilder, ClientConfig, ClientSession,
        ClientState, DisplayEvent, GabbleError, ServerConfig,
    };
    pub use gabble_protocol::{ChatMessage, ErrorCode, MessageKind};
    pub use gabble_transport::{DatagramSocket, PeerAddr, UdpTransport};
}
