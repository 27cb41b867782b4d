//! `ChatServer` builder and server loop.
//!
//! The loop is the only place the server touches the network: receive one
//! datagram, hand it to the [`ChatEngine`], send everything the engine
//! returns, repeat until the engine halts.

use gabble_protocol::{ChatMessage, WIRE_SIZE};
use gabble_transport::{DatagramSocket, PeerAddr, UdpTransport};

use crate::backoff::RecvBackoff;
use crate::engine::ChatEngine;
use crate::{GabbleError, ServerConfig};

/// Builder for configuring and starting a chat server.
///
/// # Example
///
/// ```rust,ignore
/// use gabble::prelude::*;
///
/// let server = ChatServer::builder()
///     .bind("0.0.0.0:8867")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ChatServerBuilder {
    config: ServerConfig,
}

impl ChatServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the UDP socket. The server does not read until
    /// [`run`](ChatServer::run) is called.
    pub async fn build(self) -> Result<ChatServer<UdpTransport>, GabbleError> {
        let socket = UdpTransport::bind(&self.config.bind_addr).await?;
        Ok(ChatServer::new(socket))
    }
}

impl Default for ChatServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A chat server bound to a socket.
pub struct ChatServer<S: DatagramSocket = UdpTransport> {
    socket: S,
    engine: ChatEngine,
}

impl ChatServer<UdpTransport> {
    /// Creates a new builder.
    pub fn builder() -> ChatServerBuilder {
        ChatServerBuilder::new()
    }
}

impl<S: DatagramSocket> ChatServer<S> {
    /// Wraps an already bound socket with a fresh engine.
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            engine: ChatEngine::new(),
        }
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<PeerAddr, GabbleError> {
        Ok(self.socket.local_addr()?)
    }

    /// Read access to the engine, for inspection.
    pub fn engine(&self) -> &ChatEngine {
        &self.engine
    }

    /// Runs the receive/dispatch loop until an EXIT request is handled.
    ///
    /// Datagrams that are not exactly one record, or that fail to decode,
    /// are dropped without a reply. Receive and send failures are logged
    /// and the loop carries on; repeated receive failures are spaced out
    /// by a growing delay.
    pub async fn run(mut self) -> Result<(), GabbleError> {
        tracing::info!(addr = ?self.socket.local_addr().ok(), "chat server running");
        let mut buf = [0u8; WIRE_SIZE + 1];
        let mut backoff = RecvBackoff::new();

        while !self.engine.is_halted() {
            let (len, source) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => {
                    backoff.reset();
                    received
                }
                Err(err) => {
                    let delay = backoff.failed();
                    tracing::warn!(error = %err, ?delay, "receive failed");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let request = match ChatMessage::decode(&buf[..len]) {
                Ok(request) => request,
                Err(err) => {
                    tracing::debug!(%source, error = %err, "datagram dropped");
                    continue;
                }
            };

            for outbound in self.engine.handle(source, &request) {
                let kind = outbound.message.kind;
                if let Err(err) = self
                    .socket
                    .send_to(&outbound.message.encode(), outbound.target)
                    .await
                {
                    tracing::warn!(peer = %outbound.target, %kind, error = %err, "send failed");
                }
            }
        }

        tracing::info!("chat server halted");
        Ok(())
    }
}
