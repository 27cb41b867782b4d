//! Fixed-layout encoding and decoding of [`ChatMessage`] records.
//!
//! The layout is byte-for-byte the record described in [`crate::types`]:
//! one kind byte followed by the three bounded text fields, no padding and
//! no length prefixes. A record is always exactly [`WIRE_SIZE`] bytes.

use crate::types::{GROUPNAME_LEN, MESSAGE_LEN, USERNAME_LEN, WIRE_SIZE};
use crate::{ChatMessage, FixedStr, MessageKind, ProtocolError};

const USERNAME_AT: usize = 1;
const GROUPNAME_AT: usize = USERNAME_AT + USERNAME_LEN;
const MESSAGE_AT: usize = GROUPNAME_AT + GROUPNAME_LEN;

impl ChatMessage {
    /// Serializes the record into its fixed wire layout.
    pub fn encode(&self) -> [u8; WIRE_SIZE] {
        let mut out = [0u8; WIRE_SIZE];
        out[0] = self.kind.as_u8();
        out[USERNAME_AT..GROUPNAME_AT].copy_from_slice(self.username.raw());
        out[GROUPNAME_AT..MESSAGE_AT].copy_from_slice(self.groupname.raw());
        out[MESSAGE_AT..].copy_from_slice(self.body.raw());
        out
    }

    /// Parses one datagram.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidLength`] if `data` is not exactly one record
    /// - [`ProtocolError::UnknownKind`] if the kind byte is out of range
    /// - [`ProtocolError::UnterminatedField`] if a text field lacks a NUL
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() != WIRE_SIZE {
            return Err(ProtocolError::InvalidLength {
                expected: WIRE_SIZE,
                actual: data.len(),
            });
        }

        let kind = MessageKind::try_from(data[0])?;
        let username = FixedStr::from_wire(
            field::<USERNAME_LEN>(&data[USERNAME_AT..GROUPNAME_AT]),
            "username",
        )?;
        let groupname = FixedStr::from_wire(
            field::<GROUPNAME_LEN>(&data[GROUPNAME_AT..MESSAGE_AT]),
            "groupname",
        )?;
        let body = FixedStr::from_wire(
            field::<MESSAGE_LEN>(&data[MESSAGE_AT..]),
            "message",
        )?;

        Ok(Self {
            kind,
            username,
            groupname,
            body,
        })
    }
}

/// Copies a slice of known length into an owned array.
fn field<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut raw = [0u8; N];
    raw.copy_from_slice(bytes);
    raw
}
