//! Integration tests for the chat client against a real server.

use std::time::Duration;

use gabble::prelude::*;
use gabble::protocol::WIRE_SIZE;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

// =========================================================================
// Helpers
// =========================================================================

async fn start_server() -> (PeerAddr, JoinHandle<Result<(), GabbleError>>) {
    let server = ChatServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("should have local addr");
    (addr, tokio::spawn(server.run()))
}

/// A joined client running in the background, driven through channels.
struct RunningClient {
    commands: mpsc::UnboundedSender<String>,
    display: mpsc::UnboundedReceiver<DisplayEvent>,
    handle: JoinHandle<Result<ClientState, GabbleError>>,
}

impl RunningClient {
    async fn start(server: PeerAddr, name: &str) -> Self {
        let socket = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let client = ChatClient::join(socket, server, name, Some(RECV_TIMEOUT))
            .await
            .expect("join should succeed");
        Self::run(client)
    }

    fn run(client: ChatClient) -> Self {
        assert_eq!(client.state(), ClientState::Active);

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (display_tx, display) = mpsc::unbounded_channel();
        let handle = tokio::spawn(client.run(command_rx, display_tx));
        Self {
            commands,
            display,
            handle,
        }
    }

    fn type_line(&self, line: &str) {
        self.commands.send(line.to_string()).expect("client should be running");
    }

    async fn next_event(&mut self) -> DisplayEvent {
        tokio::time::timeout(RECV_TIMEOUT, self.display.recv())
            .await
            .expect("display event should arrive")
            .expect("display channel should be open")
    }

    /// Skips events until a console line containing `needle` shows up.
    async fn wait_for_console(&mut self, needle: &str) -> String {
        loop {
            if let DisplayEvent::Console(line) = self.next_event().await {
                if line.contains(needle) {
                    return line;
                }
            }
        }
    }

    /// Waits for the session to end and returns its final state.
    async fn finish(self) -> ClientState {
        tokio::time::timeout(RECV_TIMEOUT, self.handle)
            .await
            .expect("client should finish")
            .expect("client task should not panic")
            .expect("client should end cleanly")
    }

    /// Closes the command channel, then waits like [`finish`](Self::finish).
    /// Returns the final state and every display event left over.
    async fn hang_up(self) -> (ClientState, Vec<DisplayEvent>) {
        let Self {
            commands,
            mut display,
            handle,
        } = self;
        drop(commands);
        let state = tokio::time::timeout(RECV_TIMEOUT, handle)
            .await
            .expect("client should finish")
            .expect("client task should not panic")
            .expect("client should end cleanly");
        let mut rest = Vec::new();
        while let Ok(event) = display.try_recv() {
            rest.push(event);
        }
        (state, rest)
    }
}

/// A bare socket playing the server, so tests control every datagram.
struct ScriptedServer {
    socket: UdpTransport,
    client: PeerAddr,
}

impl ScriptedServer {
    /// Accepts one JOIN with a JACK and returns the running client.
    async fn accept(name: &str) -> (Self, RunningClient) {
        let socket = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let client_socket = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let username = name.to_owned();
        let join = tokio::spawn(async move {
            ChatClient::join(client_socket, addr, &username, Some(RECV_TIMEOUT)).await
        });

        let mut server = Self {
            socket,
            client: addr,
        };
        let (request, from) = server.recv().await;
        assert_eq!(request, ChatMessage::join(name));
        server.client = from;
        server.send(&ChatMessage::jack()).await;

        let client = join
            .await
            .expect("join task should not panic")
            .expect("join should succeed");
        (server, RunningClient::run(client))
    }

    async fn recv(&self) -> (ChatMessage, PeerAddr) {
        let mut buf = [0u8; WIRE_SIZE + 1];
        let (len, from) = tokio::time::timeout(RECV_TIMEOUT, self.socket.recv_from(&mut buf))
            .await
            .expect("client should send")
            .expect("receive should succeed");
        let msg = ChatMessage::decode(&buf[..len]).expect("client sends whole records");
        (msg, from)
    }

    async fn send(&self, msg: &ChatMessage) {
        self.send_raw(&msg.encode()).await;
    }

    async fn send_raw(&self, bytes: &[u8]) {
        self.socket.send_to(bytes, self.client).await.unwrap();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_shows_welcome_and_roster() {
    let (server, _handle) = start_server().await;
    let mut alice = RunningClient::start(server, "alice").await;

    let welcome = alice.wait_for_console("Welcome to the chat, alice!").await;
    assert!(welcome.starts_with("dm(Server): "));
    assert_eq!(alice.next_event().await, DisplayEvent::RosterAdd("alice".into()));
}

#[tokio::test]
async fn test_duplicate_join_is_rejected() {
    let (server, _handle) = start_server().await;
    let _alice = RunningClient::start(server, "alice").await;

    let socket = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    let result = ChatClient::join(socket, server, "alice", Some(RECV_TIMEOUT)).await;

    assert!(matches!(
        result,
        Err(GabbleError::Rejected {
            kind: MessageKind::Error,
            code: Some(ErrorCode::UserAlreadyOnline),
        })
    ));
}

#[tokio::test]
async fn test_join_without_reply_times_out() {
    // A bound socket that never answers stands in for a lost JACK.
    let silent = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    let socket = UdpTransport::bind("127.0.0.1:0").await.unwrap();

    let result = ChatClient::join(
        socket,
        silent.local_addr().unwrap(),
        "alice",
        Some(Duration::from_millis(200)),
    )
    .await;

    assert!(matches!(result, Err(GabbleError::JoinTimedOut)));
}

#[tokio::test]
async fn test_connect_reads_client_config() {
    let (server, _handle) = start_server().await;
    let config = ClientConfig {
        username: "alice".into(),
        server_addr: server.to_string(),
        join_timeout_ms: Some(2_000),
        ..ClientConfig::default()
    };

    let client = ChatClient::connect(&config).await.expect("should join");

    assert_eq!(client.username(), "alice");
    assert_eq!(client.state(), ClientState::Active);
}

#[tokio::test]
async fn test_messages_flow_between_clients() {
    let (server, _handle) = start_server().await;
    let mut alice = RunningClient::start(server, "alice").await;
    let mut bob = RunningClient::start(server, "bob").await;
    alice.wait_for_console("bob has joined the chat.").await;

    alice.type_line("hello everyone");
    assert_eq!(bob.wait_for_console("hello").await, "alice: hello everyone");

    bob.type_line("alice:just for you");
    assert_eq!(alice.wait_for_console("just").await, "dm(bob): just for you");

    alice.type_line("creategroup:g");
    alice.wait_for_console("Group g created").await;
    alice.type_line("addtogroup:g:bob");
    bob.wait_for_console("bob joined the group").await;
    bob.type_line("groupmsg:g:hi:there");
    assert_eq!(alice.wait_for_console("hi there").await, "group(g) bob: hi there");

    bob.type_line("ghost:are you there");
    assert_eq!(bob.wait_for_console("error").await, "error: unknown username");
}

#[tokio::test]
async fn test_leave_ends_session_and_updates_roster() {
    let (server, _handle) = start_server().await;
    let mut alice = RunningClient::start(server, "alice").await;
    let bob = RunningClient::start(server, "bob").await;
    alice.wait_for_console("bob has joined the chat.").await;

    bob.type_line("leave:");
    assert_eq!(bob.finish().await, ClientState::Terminated);

    alice.wait_for_console("bob has left the chat.").await;
    loop {
        if alice.next_event().await == DisplayEvent::RosterRemove("bob".into()) {
            break;
        }
    }
}

#[tokio::test]
async fn test_exit_terminates_every_client_and_server() {
    let (server, server_handle) = start_server().await;
    let mut alice = RunningClient::start(server, "alice").await;
    let bob = RunningClient::start(server, "bob").await;
    alice.wait_for_console("bob has joined the chat.").await;

    bob.type_line("exit:");

    loop {
        if alice.next_event().await == DisplayEvent::Exit {
            break;
        }
    }
    assert_eq!(alice.finish().await, ClientState::Terminated);
    assert_eq!(bob.finish().await, ClientState::Terminated);
    tokio::time::timeout(RECV_TIMEOUT, server_handle)
        .await
        .expect("server should halt")
        .expect("server task should not panic")
        .expect("server should stop cleanly");
}

#[tokio::test]
async fn test_client_ignores_malformed_and_foreign_datagrams() {
    let (server, mut alice) = ScriptedServer::accept("alice").await;

    server.send_raw(&[1, 2, 3]).await;
    let mut oversize = ChatMessage::broadcast("bob", "too long").encode().to_vec();
    oversize.push(0);
    server.send_raw(&oversize).await;
    server.send(&ChatMessage::lack()).await;

    let stranger = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    stranger
        .send_to(&ChatMessage::exit().encode(), server.client)
        .await
        .unwrap();

    server.send(&ChatMessage::broadcast("bob", "still here")).await;

    assert_eq!(
        alice.next_event().await,
        DisplayEvent::Console("bob: still here".into()),
        "nothing before the well-formed broadcast reaches the display"
    );

    // The stranger's EXIT must not have ended the session.
    alice.type_line("hello");
    let (request, _) = server.recv().await;
    assert_eq!(request, ChatMessage::broadcast("alice", "hello"));
}

#[tokio::test]
async fn test_leave_without_lack_ends_when_input_closes() {
    let (server, alice) = ScriptedServer::accept("alice").await;

    alice.type_line("leave:");
    let (request, _) = server.recv().await;
    assert_eq!(request.kind, MessageKind::Leave);

    // No LACK ever arrives; closing the UI must still end the run and
    // stop the receiver task.
    let (state, rest) = alice.hang_up().await;

    assert_eq!(state, ClientState::Terminated);
    assert_eq!(rest.last(), Some(&DisplayEvent::Exit));
}

#[tokio::test]
async fn test_closed_input_while_active_keeps_session_running() {
    let (server, alice) = ScriptedServer::accept("alice").await;
    let RunningClient {
        commands,
        mut display,
        handle,
    } = alice;
    drop(commands);

    server.send(&ChatMessage::broadcast("bob", "anyone?")).await;
    let event = tokio::time::timeout(RECV_TIMEOUT, display.recv())
        .await
        .expect("display event should arrive");
    assert_eq!(event, Some(DisplayEvent::Console("bob: anyone?".into())));

    server.send(&ChatMessage::exit()).await;
    let state = tokio::time::timeout(RECV_TIMEOUT, handle)
        .await
        .expect("client should finish")
        .expect("client task should not panic")
        .expect("client should end cleanly");
    assert_eq!(state, ClientState::Terminated);
}

#[tokio::test]
async fn test_leaving_client_ends_on_exit_when_lack_is_lost() {
    let (server, mut alice) = ScriptedServer::accept("alice").await;

    alice.type_line("leave:");
    let (request, _) = server.recv().await;
    assert_eq!(request.kind, MessageKind::Leave);

    // Typed lines are ignored while leaving.
    alice.type_line("one more thing");
    server.send(&ChatMessage::broadcast("bob", "bye alice")).await;
    assert_eq!(
        alice.next_event().await,
        DisplayEvent::Console("bob: bye alice".into())
    );

    server.send(&ChatMessage::exit()).await;

    assert_eq!(alice.next_event().await, DisplayEvent::Exit);
    assert_eq!(alice.finish().await, ClientState::Terminated);
    let mut buf = [0u8; WIRE_SIZE + 1];
    let nothing = tokio::time::timeout(
        Duration::from_millis(200),
        server.socket.recv_from(&mut buf),
    )
    .await;
    assert!(nothing.is_err(), "no traffic after LEAVE");
}
