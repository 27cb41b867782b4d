//! Client session controller.
//!
//! Split in two like the server:
//!
//! - [`ClientSession`] is the pure state machine. It turns command lines
//!   into wire messages and server messages into [`DisplayEvent`]s.
//! - [`ChatClient`] drives it over a socket: the join handshake, a
//!   receiver task, and a loop that waits on user commands and server
//!   datagrams at the same time.
//!
//! ```text
//! Joining ──JACK──→ Active ──leave──→ Leaving ──LACK──→ Terminated
//!    │                 │                                    ↑
//!    └─other reply─→ Rejected       └────EXIT / exit────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gabble_protocol::{ChatMessage, MessageKind, WIRE_SIZE, roster};
use gabble_transport::{DatagramSocket, PeerAddr, UdpTransport};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::backoff::RecvBackoff;
use crate::{ClientConfig, Command, GabbleError};

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

/// Where the client is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// JOIN sent, waiting for the reply.
    Joining,
    /// Joined; commands and server messages both flow.
    Active,
    /// LEAVE sent; commands are ignored until LACK or EXIT arrives.
    Leaving,
    /// Finished normally.
    Terminated,
    /// The server refused the join (or never answered).
    Rejected,
}

/// An instruction for the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Print a line in the chat console.
    Console(String),
    /// Add a name to the online roster.
    RosterAdd(String),
    /// Remove a name from the online roster.
    RosterRemove(String),
    /// The session is over; close the interface.
    Exit,
}

/// The client's state machine, free of I/O.
#[derive(Debug)]
pub struct ClientSession {
    username: String,
    state: ClientState,
}

impl ClientSession {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            state: ClientState::Joining,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// `true` once the session has reached an absorbing state.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ClientState::Terminated | ClientState::Rejected)
    }

    /// `true` while typed commands are still acted on.
    pub fn accepts_commands(&self) -> bool {
        self.state == ClientState::Active
    }

    /// The JOIN request that opens the session.
    pub fn join_request(&self) -> ChatMessage {
        ChatMessage::join(&self.username)
    }

    /// Applies the server's reply to JOIN.
    ///
    /// # Errors
    /// [`GabbleError::Rejected`] if the reply is anything but JACK. The
    /// session is then `Rejected`.
    pub fn accept_join_reply(&mut self, reply: &ChatMessage) -> Result<(), GabbleError> {
        if reply.kind == MessageKind::Jack {
            self.state = ClientState::Active;
            tracing::info!(username = %self.username, "joined chat");
            return Ok(());
        }
        self.state = ClientState::Rejected;
        Err(GabbleError::Rejected {
            kind: reply.kind,
            code: reply.error_code(),
        })
    }

    /// Marks the join as failed without a reply.
    pub fn reject(&mut self) {
        self.state = ClientState::Rejected;
    }

    /// Stops waiting for a LACK that may never come.
    ///
    /// Only a `Leaving` session is affected; it becomes `Terminated`.
    /// Returns whether the state changed.
    pub fn abandon_leave(&mut self) -> bool {
        if self.state != ClientState::Leaving {
            return false;
        }
        tracing::info!(username = %self.username, "gave up waiting for leave acknowledgement");
        self.state = ClientState::Terminated;
        true
    }

    /// Turns one typed line into the message to send, if any.
    ///
    /// Only an `Active` session sends anything. `leave:` moves to
    /// `Leaving` and `exit:` ends the session at once.
    pub fn command(&mut self, line: &str) -> Option<ChatMessage> {
        if !self.accepts_commands() {
            tracing::debug!(state = ?self.state, "command ignored");
            return None;
        }
        let Some(command) = Command::parse(line) else {
            tracing::debug!(line, "malformed command ignored");
            return None;
        };
        match command {
            Command::Leave => self.state = ClientState::Leaving,
            Command::Exit => self.state = ClientState::Terminated,
            _ => {}
        }
        Some(command.into_message(&self.username))
    }

    /// Applies one server message, returning what the UI should show.
    pub fn inbound(&mut self, msg: &ChatMessage) -> Vec<DisplayEvent> {
        if !matches!(self.state, ClientState::Active | ClientState::Leaving) {
            return Vec::new();
        }
        match msg.kind {
            MessageKind::Broadcast => {
                vec![DisplayEvent::Console(format!("{}: {}", msg.username, msg.body))]
            }
            MessageKind::DirectMessage => {
                vec![DisplayEvent::Console(format!("dm({}): {}", msg.username, msg.body))]
            }
            MessageKind::GroupMessage => vec![DisplayEvent::Console(format!(
                "group({}) {}: {}",
                msg.groupname, msg.username, msg.body
            ))],
            MessageKind::List => roster::parse_page(msg)
                .names
                .into_iter()
                .map(DisplayEvent::RosterAdd)
                .collect(),
            MessageKind::Leave => {
                vec![DisplayEvent::RosterRemove(msg.username.text().into_owned())]
            }
            MessageKind::Error => {
                let description = match msg.error_code() {
                    Some(code) => code.to_string(),
                    None => "unrecognized error code".to_string(),
                };
                vec![DisplayEvent::Console(format!("error: {description}"))]
            }
            MessageKind::Exit => {
                tracing::info!("server sent exit");
                self.state = ClientState::Terminated;
                Vec::new()
            }
            MessageKind::Lack if self.state == ClientState::Leaving => {
                tracing::info!("leave acknowledged");
                self.state = ClientState::Terminated;
                Vec::new()
            }
            kind => {
                tracing::debug!(%kind, "unexpected message from server ignored");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// What the receiver task should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiverMode {
    Normal,
    /// LEAVE went out, so a LACK is the last message.
    LeaveSent,
    /// Stop now.
    Shutdown,
}

/// A joined chat client.
///
/// Created by [`connect`](ChatClient::connect) or [`join`](Self::join),
/// both of which complete the handshake first. Then call
/// [`run`](Self::run) with the UI's two channels.
pub struct ChatClient<S: DatagramSocket = UdpTransport> {
    socket: Arc<S>,
    server: PeerAddr,
    session: ClientSession,
}

impl ChatClient<UdpTransport> {
    /// Binds a UDP socket per `config` and joins the server.
    pub async fn connect(config: &ClientConfig) -> Result<Self, GabbleError> {
        let server = parse_addr(&config.server_addr)?;
        let socket = UdpTransport::bind(&config.bind_addr).await?;
        Self::join(socket, server, &config.username, config.join_timeout()).await
    }
}

impl<S: DatagramSocket> ChatClient<S> {
    /// Sends JOIN as `username` and waits for the first reply from
    /// `server`.
    ///
    /// Without a timeout this waits forever, as a lost JACK is never
    /// resent.
    ///
    /// # Errors
    /// - [`GabbleError::Rejected`] if the reply is not JACK
    /// - [`GabbleError::JoinTimedOut`] if `timeout` elapses first
    /// - [`GabbleError::Transport`] if the socket fails
    pub async fn join(
        socket: S,
        server: PeerAddr,
        username: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, GabbleError> {
        let mut session = ClientSession::new(username);
        socket
            .send_to(&session.join_request().encode(), server)
            .await?;
        tracing::debug!(%username, %server, "join sent, waiting for reply");

        let reply = match timeout {
            Some(limit) => match tokio::time::timeout(limit, next_reply(&socket, server)).await {
                Ok(reply) => reply?,
                Err(_) => {
                    session.reject();
                    tracing::warn!(%username, ?limit, "no reply to join");
                    return Err(GabbleError::JoinTimedOut);
                }
            },
            None => next_reply(&socket, server).await?,
        };
        session.accept_join_reply(&reply)?;

        Ok(Self {
            socket: Arc::new(socket),
            server,
            session,
        })
    }

    pub fn username(&self) -> &str {
        self.session.username()
    }

    pub fn state(&self) -> ClientState {
        self.session.state()
    }

    /// The local address the client sends from.
    pub fn local_addr(&self) -> Result<PeerAddr, GabbleError> {
        Ok(self.socket.local_addr()?)
    }

    /// Runs the session until it terminates.
    ///
    /// Lines from `commands` become requests; server messages become
    /// events on `display`. A closed `commands` channel stops input but
    /// not the session, unless LEAVE was already sent: then the session
    /// ends without its LACK. The final event is always
    /// [`DisplayEvent::Exit`]. Returns the state the session ended in.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<String>,
        display: mpsc::UnboundedSender<DisplayEvent>,
    ) -> Result<ClientState, GabbleError> {
        let (mode_tx, mode_rx) = watch::channel(ReceiverMode::Normal);
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let receiver = spawn_receiver(Arc::clone(&self.socket), self.server, inbound_tx, mode_rx);
        let mut commands_open = true;

        while !self.session.is_finished() {
            tokio::select! {
                line = commands.recv(), if commands_open => {
                    let Some(line) = line else {
                        tracing::debug!("command source closed");
                        commands_open = false;
                        self.session.abandon_leave();
                        continue;
                    };
                    let Some(msg) = self.session.command(&line) else {
                        continue;
                    };
                    if msg.kind == MessageKind::Leave {
                        let _ = mode_tx.send(ReceiverMode::LeaveSent);
                    }
                    if let Err(err) = self.socket.send_to(&msg.encode(), self.server).await {
                        tracing::warn!(error = %err, kind = %msg.kind, "send failed");
                    }
                }
                inbound = inbound_rx.recv() => {
                    let Some(msg) = inbound else {
                        tracing::debug!("receiver stopped");
                        break;
                    };
                    for event in self.session.inbound(&msg) {
                        let _ = display.send(event);
                    }
                }
            }
        }

        let _ = mode_tx.send(ReceiverMode::Shutdown);
        if let Err(err) = receiver.await {
            tracing::warn!(error = %err, "receiver task failed");
        }
        let _ = display.send(DisplayEvent::Exit);
        tracing::info!(state = ?self.session.state(), "client session ended");
        Ok(self.session.state())
    }
}

/// Waits for the first well-formed datagram from `server`.
async fn next_reply<S: DatagramSocket>(
    socket: &S,
    server: PeerAddr,
) -> Result<ChatMessage, GabbleError> {
    let mut buf = [0u8; WIRE_SIZE + 1];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        if let Some(msg) = accept_datagram(&buf[..len], from, server) {
            return Ok(msg);
        }
    }
}

/// Decodes a datagram from `server`, dropping anything else with a log.
fn accept_datagram(data: &[u8], from: PeerAddr, server: PeerAddr) -> Option<ChatMessage> {
    if !from.same_endpoint(server) {
        tracing::debug!(%from, "datagram from unknown peer dropped");
        return None;
    }
    match ChatMessage::decode(data) {
        Ok(msg) => Some(msg),
        Err(err) => {
            tracing::debug!(%from, error = %err, "malformed datagram dropped");
            None
        }
    }
}

/// Forwards server messages to the controller until EXIT, a LACK after
/// LEAVE, or a shutdown signal.
fn spawn_receiver<S: DatagramSocket>(
    socket: Arc<S>,
    server: PeerAddr,
    inbound: mpsc::UnboundedSender<ChatMessage>,
    mut mode: watch::Receiver<ReceiverMode>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = [0u8; WIRE_SIZE + 1];
        let mut backoff = RecvBackoff::new();
        loop {
            tokio::select! {
                changed = mode.changed() => {
                    if changed.is_err() || *mode.borrow() == ReceiverMode::Shutdown {
                        break;
                    }
                }
                received = socket.recv_from(&mut buf) => {
                    let (len, from) = match received {
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
                    let Some(msg) = accept_datagram(&buf[..len], from, server) else {
                        continue;
                    };
                    let last = msg.kind == MessageKind::Exit
                        || (msg.kind == MessageKind::Lack
                            && *mode.borrow() == ReceiverMode::LeaveSent);
                    if inbound.send(msg).is_err() || last {
                        break;
                    }
                }
            }
        }
        tracing::debug!("receiver task finished");
    })
}

fn parse_addr(addr: &str) -> Result<PeerAddr, GabbleError> {
    addr.parse::<SocketAddr>()
        .map(PeerAddr::new)
        .map_err(|source| GabbleError::InvalidAddress {
            addr: addr.to_owned(),
            source,
        })
}
