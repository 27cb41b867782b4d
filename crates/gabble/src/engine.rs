//! Server dispatch engine.
//!
//! [`ChatEngine`] owns both directories and turns one decoded request into
//! the datagrams the server must send in reply. It does no I/O: the server
//! loop feeds it requests and delivers whatever it returns, in order. One
//! request is fully handled before the next is read, so no state is shared
//! and nothing is locked.
//!
//! Failures fall into two groups. Conflicts and lookup failures are
//! answered with an ERROR datagram to the requester. Malformed requests
//! are dropped without a reply.

use gabble_group::{GroupDirectory, GroupError};
use gabble_protocol::{
    ALL_USERS, ChatMessage, ErrorCode, MessageKind, SERVER_USERNAME, roster,
};
use gabble_session::{SessionDirectory, SessionError};
use gabble_transport::PeerAddr;

/// One datagram the server must send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub target: PeerAddr,
    pub message: ChatMessage,
}

impl Outbound {
    pub fn new(target: PeerAddr, message: ChatMessage) -> Self {
        Self { target, message }
    }
}

/// Why a request produced no normal reply.
enum Refusal {
    /// Answer the requester with an ERROR carrying this code.
    Reply(ErrorCode),
    /// Drop the request silently.
    Ignore(&'static str),
}

type Handled = Result<Vec<Outbound>, Refusal>;

/// The server's state machine: online users, groups, and the halt flag.
#[derive(Debug, Default)]
pub struct ChatEngine {
    sessions: SessionDirectory,
    groups: GroupDirectory,
    halted: bool,
}

impl ChatEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one request received from `source`.
    ///
    /// Returns the datagrams to send, in the order they must go out. After
    /// EXIT has been handled the engine is halted and ignores everything.
    pub fn handle(&mut self, source: PeerAddr, msg: &ChatMessage) -> Vec<Outbound> {
        if self.halted {
            tracing::debug!(%source, kind = %msg.kind, "engine halted, ignoring request");
            return Vec::new();
        }
        tracing::debug!(%source, kind = %msg.kind, username = %msg.username, "dispatching request");

        let handled = match msg.kind {
            MessageKind::Join => self.handle_join(source, msg),
            MessageKind::Leave => self.handle_leave(source),
            MessageKind::Broadcast => Ok(self.handle_broadcast(source, msg)),
            MessageKind::DirectMessage => self.handle_direct_message(source, msg),
            MessageKind::List => Ok(self.handle_list(source, msg)),
            MessageKind::Exit => Ok(self.handle_exit()),
            MessageKind::CreateGroup => self.handle_create_group(source, msg),
            MessageKind::AddToGroup => self.handle_add_to_group(msg),
            MessageKind::GroupMessage => self.handle_group_message(msg),
            MessageKind::Jack
            | MessageKind::Lack
            | MessageKind::Error
            | MessageKind::RemoveFromGroup => {
                Err(Refusal::Reply(ErrorCode::UnexpectedMessage))
            }
        };

        match handled {
            Ok(outbound) => outbound,
            Err(Refusal::Reply(code)) => {
                tracing::warn!(%source, kind = %msg.kind, %code, "request refused");
                vec![Outbound::new(source, ChatMessage::error(code))]
            }
            Err(Refusal::Ignore(reason)) => {
                tracing::debug!(%source, kind = %msg.kind, reason, "request dropped");
                Vec::new()
            }
        }
    }

    /// `true` once EXIT has been handled.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The online user directory.
    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }

    /// The group directory.
    pub fn groups(&self) -> &GroupDirectory {
        &self.groups
    }

    // -- Handlers ---------------------------------------------------------

    fn handle_join(&mut self, source: PeerAddr, msg: &ChatMessage) -> Handled {
        let username = msg.username.text();
        match self.sessions.join(&username, source) {
            Ok(_) => {}
            Err(SessionError::AlreadyOnline(_)) => {
                return Err(Refusal::Reply(ErrorCode::UserAlreadyOnline));
            }
            Err(_) => return Err(Refusal::Reply(ErrorCode::UnknownUsername)),
        }

        let mut out = vec![Outbound::new(source, ChatMessage::jack())];
        let notice = ChatMessage::broadcast(
            SERVER_USERNAME,
            &format!("{username} has joined the chat."),
        );
        out.extend(self.to_everyone_except(&username, &notice));

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let welcome = format!("Welcome to the chat, {username}! It is now {now}");
        out.push(Outbound::new(
            source,
            ChatMessage::direct_message(SERVER_USERNAME, &welcome),
        ));

        for page in roster::paginate(self.sessions.usernames()) {
            out.extend(self.to_everyone(&page));
        }
        Ok(out)
    }

    fn handle_leave(&mut self, source: PeerAddr) -> Handled {
        let username = match self.sessions.find_by_endpoint(source) {
            Ok(session) => session.username.clone(),
            Err(_) => return Err(Refusal::Reply(ErrorCode::UnknownUsername)),
        };

        let notice = ChatMessage::broadcast(
            SERVER_USERNAME,
            &format!("{username} has left the chat."),
        );
        let mut out = self.to_everyone_except(&username, &notice);

        self.sessions
            .remove(&username)
            .map_err(|_| Refusal::Reply(ErrorCode::UnknownUsername))?;
        out.push(Outbound::new(source, ChatMessage::lack()));
        out.extend(self.to_everyone(&ChatMessage::leave_notice(&username)));
        Ok(out)
    }

    /// Fans out to every user on the sender's host except the sending
    /// socket itself. Users on other hosts do not receive it.
    fn handle_broadcast(&self, source: PeerAddr, msg: &ChatMessage) -> Vec<Outbound> {
        let relay = ChatMessage::broadcast(&msg.username.text(), &msg.body.text());
        self.sessions
            .iter()
            .filter(|session| session.addr.same_host(source) && !session.is_at(source))
            .map(|session| Outbound::new(session.addr, relay.clone()))
            .collect()
    }

    fn handle_direct_message(&self, source: PeerAddr, msg: &ChatMessage) -> Handled {
        let body = msg.body.text();
        let (recipient, text) = body
            .split_once(':')
            .ok_or(Refusal::Ignore("direct message without recipient separator"))?;

        let sender = msg.username.text();
        let sender_session = self
            .sessions
            .get(&sender)
            .ok_or(Refusal::Ignore("direct message from unknown sender"))?;
        if !sender_session.is_at(source) {
            return Err(Refusal::Ignore("direct message sender address mismatch"));
        }

        let recipient = self
            .sessions
            .get(recipient)
            .ok_or(Refusal::Reply(ErrorCode::UnknownUsername))?;
        Ok(vec![Outbound::new(
            recipient.addr,
            ChatMessage::direct_message(&sender, text),
        )])
    }

    fn handle_list(&self, source: PeerAddr, msg: &ChatMessage) -> Vec<Outbound> {
        let pages = roster::paginate(self.sessions.usernames());
        if msg.username.text() == ALL_USERS {
            pages.iter().flat_map(|page| self.to_everyone(page)).collect()
        } else {
            pages
                .into_iter()
                .map(|page| Outbound::new(source, page))
                .collect()
        }
    }

    fn handle_exit(&mut self) -> Vec<Outbound> {
        let out = self.to_everyone(&ChatMessage::exit());
        let released = self.sessions.clear();
        self.groups.clear();
        self.halted = true;
        tracing::info!(released = released.len(), "exit received, engine halted");
        out
    }

    fn handle_create_group(&mut self, source: PeerAddr, msg: &ChatMessage) -> Handled {
        let group = msg.groupname.text();
        if group.is_empty() {
            return Err(Refusal::Ignore("create group without a name"));
        }
        let creator = msg.username.text();

        self.groups.create(&group, &creator).map_err(|err| match err {
            GroupError::AlreadyExists(_) => Refusal::Reply(ErrorCode::GroupAlreadyExists),
            _ => Refusal::Ignore("unexpected group error"),
        })?;

        let notice = ChatMessage::broadcast(
            SERVER_USERNAME,
            &format!("{creator} created group {group}"),
        );
        let mut out = self.to_everyone_except(&creator, &notice);
        out.push(Outbound::new(
            source,
            ChatMessage::direct_message(SERVER_USERNAME, &format!("Group {group} created")),
        ));
        Ok(out)
    }

    fn handle_add_to_group(&mut self, msg: &ChatMessage) -> Handled {
        let group = msg.groupname.text();
        let user = msg.username.text();

        if !self.groups.contains(&group) {
            return Err(Refusal::Reply(ErrorCode::GroupNotFound));
        }
        if !self.sessions.contains(&user) {
            return Err(Refusal::Reply(ErrorCode::UnknownUsername));
        }
        self.groups.add(&group, &user).map_err(|err| match err {
            GroupError::NotFound(_) => Refusal::Reply(ErrorCode::GroupNotFound),
            GroupError::AlreadyMember { .. } => Refusal::Reply(ErrorCode::UserAlreadyInGroup),
            _ => Refusal::Ignore("unexpected group error"),
        })?;

        let notice = ChatMessage::group_message(
            &group,
            SERVER_USERNAME,
            &format!("{user} joined the group"),
        );
        Ok(self.to_online_members(&group, &notice))
    }

    fn handle_group_message(&self, msg: &ChatMessage) -> Handled {
        let group = msg.groupname.text();
        let sender = msg.username.text();

        self.groups
            .members_for_sender(&group, &sender)
            .map_err(|err| match err {
                GroupError::NotFound(_) => Refusal::Reply(ErrorCode::GroupNotFound),
                _ => Refusal::Reply(ErrorCode::UserNotInGroup),
            })?;

        let relay = ChatMessage::group_message(&group, &sender, &msg.body.text());
        Ok(self.to_online_members(&group, &relay))
    }

    // -- Fan-out helpers --------------------------------------------------

    fn to_everyone(&self, msg: &ChatMessage) -> Vec<Outbound> {
        self.sessions
            .iter()
            .map(|session| Outbound::new(session.addr, msg.clone()))
            .collect()
    }

    fn to_everyone_except(&self, username: &str, msg: &ChatMessage) -> Vec<Outbound> {
        self.sessions
            .iter()
            .filter(|session| session.username != username)
            .map(|session| Outbound::new(session.addr, msg.clone()))
            .collect()
    }

    /// Members of `group` that are currently online, in join order.
    fn to_online_members(&self, group: &str, msg: &ChatMessage) -> Vec<Outbound> {
        self.groups
            .members(group)
            .unwrap_or_default()
            .iter()
            .filter_map(|member| self.sessions.get(member))
            .map(|session| Outbound::new(session.addr, msg.clone()))
            .collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
