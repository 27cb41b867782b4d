//! Core protocol types for Gabble's wire format.
//!
//! Every datagram is one fixed-size record:
//!
//! ```text
//! ┌──────┬───────────────┬────────────────┬──────────────────┐
//! │ kind │ username      │ groupname      │ message (body)   │
//! │ 1 B  │ 64 B, C-str   │ 64 B, C-str    │ 1024 B, C-str    │
//! └──────┴───────────────┴────────────────┴──────────────────┘
//! ```
//!
//! Text fields are NUL-terminated inside their bound; an unused field is the
//! empty string. ERROR records carry a big-endian `u16` code in the first two
//! bytes of the body.

use std::borrow::Cow;
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Size of the `username` field, terminator included.
pub const USERNAME_LEN: usize = 64;

/// Size of the `groupname` field, terminator included.
pub const GROUPNAME_LEN: usize = 64;

/// Size of the `message` (body) field, terminator included.
pub const MESSAGE_LEN: usize = 1024;

/// Total size of one wire record. Datagrams of any other size are dropped.
pub const WIRE_SIZE: usize = 1 + USERNAME_LEN + GROUPNAME_LEN + MESSAGE_LEN;

/// Well-known port the server listens on.
pub const SERVER_PORT: u16 = 8867;

/// LIST requester name meaning "send every page to every online user".
pub const ALL_USERS: &str = "__ALL";

/// Sentinel token closing a paginated LIST roster.
pub const LIST_END: &str = "END";

/// Username the server signs its own notices with.
pub const SERVER_USERNAME: &str = "Server";

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The command carried by a record.
///
/// Ordinals are stable and contiguous from 0; they are the kind byte on the
/// wire. There is deliberately no `Unknown` variant: a byte outside this
/// range fails to decode and never becomes a `MessageKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Join = 0,
    Jack = 1,
    Broadcast = 2,
    DirectMessage = 3,
    CreateGroup = 4,
    AddToGroup = 5,
    GroupMessage = 6,
    /// Reserved. No client sends it and the server treats it as unexpected.
    RemoveFromGroup = 7,
    List = 8,
    Leave = 9,
    Lack = 10,
    Exit = 11,
    Error = 12,
}

impl MessageKind {
    /// Every kind, in ordinal order.
    pub const ALL: [MessageKind; 13] = [
        Self::Join,
        Self::Jack,
        Self::Broadcast,
        Self::DirectMessage,
        Self::CreateGroup,
        Self::AddToGroup,
        Self::GroupMessage,
        Self::RemoveFromGroup,
        Self::List,
        Self::Leave,
        Self::Lack,
        Self::Exit,
        Self::Error,
    ];

    /// The kind byte written on the wire.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, ProtocolError> {
        Self::ALL
            .get(usize::from(byte))
            .copied()
            .ok_or(ProtocolError::UnknownKind(byte))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Join => "JOIN",
            Self::Jack => "JACK",
            Self::Broadcast => "BROADCAST",
            Self::DirectMessage => "DIRECTMESSAGE",
            Self::CreateGroup => "CREATE_GROUP",
            Self::AddToGroup => "ADD_TO_GROUP",
            Self::GroupMessage => "GROUP_MESSAGE",
            Self::RemoveFromGroup => "REMOVE_FROM_GROUP",
            Self::List => "LIST",
            Self::Leave => "LEAVE",
            Self::Lack => "LACK",
            Self::Exit => "EXIT",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Error codes carried by ERROR records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    UserAlreadyOnline = 0,
    UnknownUsername = 1,
    UnexpectedMessage = 2,
    GroupAlreadyExists = 3,
    UserAlreadyInGroup = 4,
    GroupNotFound = 5,
    UserNotInGroup = 6,
}

impl ErrorCode {
    /// The numeric code written on the wire.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = ProtocolError;

    fn try_from(code: u16) -> Result<Self, ProtocolError> {
        match code {
            0 => Ok(Self::UserAlreadyOnline),
            1 => Ok(Self::UnknownUsername),
            2 => Ok(Self::UnexpectedMessage),
            3 => Ok(Self::GroupAlreadyExists),
            4 => Ok(Self::UserAlreadyInGroup),
            5 => Ok(Self::GroupNotFound),
            6 => Ok(Self::UserNotInGroup),
            other => Err(ProtocolError::UnknownErrorCode(other)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UserAlreadyOnline => "user already online",
            Self::UnknownUsername => "unknown username",
            Self::UnexpectedMessage => "unexpected message",
            Self::GroupAlreadyExists => "group already exists",
            Self::UserAlreadyInGroup => "user already in group",
            Self::GroupNotFound => "group not found",
            Self::UserNotInGroup => "user not in group",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// FixedStr: bounded, always-terminated text field
// ---------------------------------------------------------------------------

/// A text field of exactly `N` bytes, always NUL-terminated within `N`.
///
/// Construction never fails: input longer than `N - 1` bytes is truncated
/// (backing off to a UTF-8 character boundary), so the terminator always
/// fits. The text ends at the first NUL, which means an embedded NUL in the
/// input also ends it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedStr<const N: usize>([u8; N]);

impl<const N: usize> FixedStr<N> {
    /// Longest text the field can hold.
    pub const CAPACITY: usize = N - 1;

    /// An empty field (all zero bytes).
    pub fn empty() -> Self {
        Self([0u8; N])
    }

    /// Builds a field from `text`, truncating to [`Self::CAPACITY`] bytes.
    pub fn new(text: &str) -> Self {
        let mut end = text.len().min(Self::CAPACITY);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut raw = [0u8; N];
        raw[..end].copy_from_slice(&text.as_bytes()[..end]);
        Self(raw)
    }

    /// Wraps raw bytes read off the wire.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnterminatedField`] if no NUL byte exists.
    pub(crate) fn from_wire(
        raw: [u8; N],
        field: &'static str,
    ) -> Result<Self, ProtocolError> {
        if raw.contains(&0) {
            Ok(Self(raw))
        } else {
            Err(ProtocolError::UnterminatedField(field))
        }
    }

    /// Wraps raw bytes the caller guarantees contain a NUL.
    pub(crate) fn from_raw_terminated(raw: [u8; N]) -> Self {
        debug_assert!(raw.contains(&0), "field must contain a terminator");
        Self(raw)
    }

    /// The text bytes, up to (not including) the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        &self.0[..end]
    }

    /// The text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// `true` if the text is empty.
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// All `N` bytes as laid out on the wire.
    pub fn raw(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.text(), f)
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ---------------------------------------------------------------------------
// ChatMessage: the wire record
// ---------------------------------------------------------------------------

/// One wire record. The only thing that crosses the network.
///
/// Field meaning depends on [`kind`](Self::kind): `username` is the sender,
/// the target, or the affected user; `groupname` is only used by group
/// kinds; `body` is free text, a packed roster, or an error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub kind: MessageKind,
    pub username: FixedStr<USERNAME_LEN>,
    pub groupname: FixedStr<GROUPNAME_LEN>,
    pub body: FixedStr<MESSAGE_LEN>,
}

impl ChatMessage {
    /// A record of the given kind with every text field empty.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            username: FixedStr::empty(),
            groupname: FixedStr::empty(),
            body: FixedStr::empty(),
        }
    }

    /// Reads the error code of an ERROR record.
    ///
    /// Returns `None` for other kinds or for a code outside the known set.
    pub fn error_code(&self) -> Option<ErrorCode> {
        if self.kind != MessageKind::Error {
            return None;
        }
        let raw = self.body.raw();
        ErrorCode::try_from(u16::from_be_bytes([raw[0], raw[1]])).ok()
    }
}
