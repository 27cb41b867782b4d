//! The session directory: every user currently online.
//!
//! Owned by a single engine and mutated only from its dispatch loop, so
//! it is a plain map with no locking. A `BTreeMap` keeps iteration in
//! username order, which makes fan-out order and LIST pages
//! deterministic.

use std::collections::BTreeMap;

use gabble_protocol::{ALL_USERS, LIST_END, USERNAME_LEN};
use gabble_transport::PeerAddr;

use crate::{Session, SessionError};

/// All online users, keyed by username.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: BTreeMap<String, Session>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings `username` online at `addr`.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyOnline`] if the name is taken (checked first)
    /// - [`SessionError::InvalidUsername`] if the name is empty, longer
    ///   than the wire field allows, contains the roster separator `:`, or
    ///   is one of the reserved names `END` and `__ALL`
    pub fn join(
        &mut self,
        username: &str,
        addr: PeerAddr,
    ) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(username) {
            return Err(SessionError::AlreadyOnline(username.to_owned()));
        }
        if !is_valid_username(username) {
            return Err(SessionError::InvalidUsername(username.to_owned()));
        }

        tracing::info!(%username, %addr, "user joined");
        let session = self
            .sessions
            .entry(username.to_owned())
            .or_insert_with(|| Session::new(username, addr));
        Ok(session)
    }

    /// Looks up a session by username.
    pub fn get(&self, username: &str) -> Option<&Session> {
        self.sessions.get(username)
    }

    /// `true` if `username` is online.
    pub fn contains(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    /// Finds the session joined from exactly `addr` (IP and port).
    ///
    /// # Errors
    /// [`SessionError::UnknownAddress`] if nobody joined from there.
    pub fn find_by_endpoint(
        &self,
        addr: PeerAddr,
    ) -> Result<&Session, SessionError> {
        self.sessions
            .values()
            .find(|session| session.is_at(addr))
            .ok_or(SessionError::UnknownAddress(addr))
    }

    /// Takes `username` offline, returning its session.
    ///
    /// # Errors
    /// [`SessionError::UnknownUser`] if the user is not online.
    pub fn remove(&mut self, username: &str) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(username)
            .ok_or_else(|| SessionError::UnknownUser(username.to_owned()))?;
        tracing::info!(%username, addr = %session.addr, "user left");
        Ok(session)
    }

    /// Takes everyone offline, returning the released sessions.
    pub fn clear(&mut self) -> Vec<Session> {
        let released: Vec<Session> =
            std::mem::take(&mut self.sessions).into_values().collect();
        tracing::info!(count = released.len(), "session directory cleared");
        released
    }

    /// Every online session, in username order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Every online username, in order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    /// Number of users online.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if nobody is online.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Names that fit the wire field and cannot be confused with roster
/// separators or sentinels.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() < USERNAME_LEN
        && !username.contains(':')
        && username != LIST_END
        && username != ALL_USERS
}

// =========================================================================
// Tests
// =========================================================================
