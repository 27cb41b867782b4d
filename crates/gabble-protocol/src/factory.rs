//! Message factory: one constructor per command kind.
//!
//! Each constructor takes only the fields that matter for its kind and
//! leaves the rest empty. Oversized input is truncated by [`FixedStr::new`],
//! so none of these can fail or overflow a field.

use crate::types::MESSAGE_LEN;
use crate::{ChatMessage, ErrorCode, FixedStr, MessageKind};

impl ChatMessage {
    /// JOIN: `username` asks to come online.
    pub fn join(username: &str) -> Self {
        Self::with_username(MessageKind::Join, username)
    }

    /// JACK: the server accepted a JOIN.
    pub fn jack() -> Self {
        Self::new(MessageKind::Jack)
    }

    /// BROADCAST: `username` says `text` to everyone.
    pub fn broadcast(username: &str, text: &str) -> Self {
        let mut msg = Self::with_username(MessageKind::Broadcast, username);
        msg.body = FixedStr::new(text);
        msg
    }

    /// DIRECTMESSAGE with a raw body.
    ///
    /// Client to server, the body is `"<recipient>:<text>"` (see
    /// [`direct_message_to`](Self::direct_message_to)). Server to client,
    /// `username` is the sender and the body is the bare text.
    pub fn direct_message(username: &str, body: &str) -> Self {
        let mut msg = Self::with_username(MessageKind::DirectMessage, username);
        msg.body = FixedStr::new(body);
        msg
    }

    /// DIRECTMESSAGE request from `sender` addressed to `recipient`.
    pub fn direct_message_to(sender: &str, recipient: &str, text: &str) -> Self {
        Self::direct_message(sender, &format!("{recipient}:{text}"))
    }

    /// CREATE_GROUP: `username` creates `group_name`.
    pub fn create_group(group_name: &str, username: &str) -> Self {
        let mut msg = Self::with_username(MessageKind::CreateGroup, username);
        msg.groupname = FixedStr::new(group_name);
        msg
    }

    /// ADD_TO_GROUP: add `username` to `group_name`.
    pub fn add_to_group(group_name: &str, username: &str) -> Self {
        let mut msg = Self::with_username(MessageKind::AddToGroup, username);
        msg.groupname = FixedStr::new(group_name);
        msg
    }

    /// GROUP_MESSAGE: `username` says `text` to `group_name`.
    pub fn group_message(group_name: &str, username: &str, text: &str) -> Self {
        let mut msg = Self::with_username(MessageKind::GroupMessage, username);
        msg.groupname = FixedStr::new(group_name);
        msg.body = FixedStr::new(text);
        msg
    }

    /// LIST request. `requester` is empty for "reply to me" or
    /// [`ALL_USERS`](crate::ALL_USERS) for a roster refresh to everyone.
    pub fn list(requester: &str) -> Self {
        Self::with_username(MessageKind::List, requester)
    }

    /// One LIST page as sent by the server: packed names in both fields.
    pub fn list_page(username_part: &str, body_part: &str) -> Self {
        let mut msg = Self::with_username(MessageKind::List, username_part);
        msg.body = FixedStr::new(body_part);
        msg
    }

    /// LEAVE request from a client. Identity comes from the source address.
    pub fn leave() -> Self {
        Self::new(MessageKind::Leave)
    }

    /// LEAVE notice from the server: `username` went offline.
    pub fn leave_notice(username: &str) -> Self {
        Self::with_username(MessageKind::Leave, username)
    }

    /// LACK: the server processed a LEAVE.
    pub fn lack() -> Self {
        Self::new(MessageKind::Lack)
    }

    /// EXIT: shut everything down.
    pub fn exit() -> Self {
        Self::new(MessageKind::Exit)
    }

    /// ERROR carrying `code` as a big-endian `u16` in the body.
    pub fn error(code: ErrorCode) -> Self {
        let mut raw = [0u8; MESSAGE_LEN];
        raw[..2].copy_from_slice(&code.as_u16().to_be_bytes());
        let mut msg = Self::new(MessageKind::Error);
        msg.body = FixedStr::from_raw_terminated(raw);
        msg
    }

    fn with_username(kind: MessageKind, username: &str) -> Self {
        let mut msg = Self::new(kind);
        msg.username = FixedStr::new(username);
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GROUPNAME_LEN, USERNAME_LEN, WIRE_SIZE};

    /// Encodes and decodes, as the message would cross the network.
    fn over_the_wire(msg: &ChatMessage) -> ChatMessage {
        ChatMessage::decode(&msg.encode()).expect("factory output must decode")
    }

    #[test]
    fn test_join_carries_username_only() {
        let msg = over_the_wire(&ChatMessage::join("alice"));
        assert_eq!(msg.kind, MessageKind::Join);
        assert_eq!(msg.username.text(), "alice");
        assert!(msg.groupname.is_empty());
        assert!(msg.body.is_empty());
    }

    #[test]
    fn test_acks_and_exit_have_empty_fields() {
        for (msg, kind) in [
            (ChatMessage::jack(), MessageKind::Jack),
            (ChatMessage::lack(), MessageKind::Lack),
            (ChatMessage::leave(), MessageKind::Leave),
            (ChatMessage::exit(), MessageKind::Exit),
        ] {
            let msg = over_the_wire(&msg);
            assert_eq!(msg.kind, kind);
            assert!(msg.username.is_empty());
            assert!(msg.groupname.is_empty());
            assert!(msg.body.is_empty());
        }
    }

    #[test]
    fn test_broadcast_carries_sender_and_text() {
        let msg = over_the_wire(&ChatMessage::broadcast("bob", "hello all"));
        assert_eq!(msg.kind, MessageKind::Broadcast);
        assert_eq!(msg.username.text(), "bob");
        assert_eq!(msg.body.text(), "hello all");
    }

    #[test]
    fn test_direct_message_to_packs_recipient_before_colon() {
        let msg = over_the_wire(&ChatMessage::direct_message_to(
            "alice", "bob", "see you at 10:30",
        ));
        assert_eq!(msg.kind, MessageKind::DirectMessage);
        assert_eq!(msg.username.text(), "alice");
        assert_eq!(msg.body.text(), "bob:see you at 10:30");
    }

    #[test]
    fn test_group_constructors_fill_groupname() {
        let create = over_the_wire(&ChatMessage::create_group("rust", "alice"));
        assert_eq!(create.kind, MessageKind::CreateGroup);
        assert_eq!(create.groupname.text(), "rust");
        assert_eq!(create.username.text(), "alice");
        assert!(create.body.is_empty());

        let add = over_the_wire(&ChatMessage::add_to_group("rust", "bob"));
        assert_eq!(add.kind, MessageKind::AddToGroup);
        assert_eq!(add.groupname.text(), "rust");
        assert_eq!(add.username.text(), "bob");

        let say = over_the_wire(&ChatMessage::group_message("rust", "bob", "hi"));
        assert_eq!(say.kind, MessageKind::GroupMessage);
        assert_eq!(say.groupname.text(), "rust");
        assert_eq!(say.username.text(), "bob");
        assert_eq!(say.body.text(), "hi");
    }

    #[test]
    fn test_leave_notice_names_departed_user() {
        let msg = over_the_wire(&ChatMessage::leave_notice("carol"));
        assert_eq!(msg.kind, MessageKind::Leave);
        assert_eq!(msg.username.text(), "carol");
    }

    #[test]
    fn test_error_round_trips_every_code() {
        for code in [
            ErrorCode::UserAlreadyOnline,
            ErrorCode::UnknownUsername,
            ErrorCode::UnexpectedMessage,
            ErrorCode::GroupAlreadyExists,
            ErrorCode::UserAlreadyInGroup,
            ErrorCode::GroupNotFound,
            ErrorCode::UserNotInGroup,
        ] {
            let msg = over_the_wire(&ChatMessage::error(code));
            assert_eq!(msg.error_code(), Some(code));
        }
    }

    #[test]
    fn test_oversized_fields_truncate_to_capacity() {
        let long_name = "n".repeat(200);
        let long_group = "g".repeat(200);
        let long_text = "t".repeat(5000);

        let msg = ChatMessage::group_message(&long_group, &long_name, &long_text);
        let bytes = msg.encode();
        assert_eq!(bytes.len(), WIRE_SIZE);

        let msg = over_the_wire(&msg);
        assert_eq!(msg.username.len(), USERNAME_LEN - 1);
        assert_eq!(msg.groupname.len(), GROUPNAME_LEN - 1);
        assert_eq!(msg.body.len(), MESSAGE_LEN - 1);
        assert_eq!(msg.username.raw()[USERNAME_LEN - 1], 0);
        assert_eq!(msg.groupname.raw()[GROUPNAME_LEN - 1], 0);
        assert_eq!(msg.body.raw()[MESSAGE_LEN - 1], 0);
    }

    #[test]
    fn test_exactly_capacity_sized_input_is_not_truncated() {
        let name = "a".repeat(USERNAME_LEN - 1);
        let msg = over_the_wire(&ChatMessage::join(&name));
        assert_eq!(msg.username.text(), name);
    }
}
