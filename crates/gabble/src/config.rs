//! Server and client configuration.
//!
//! Both structs deserialize from JSON with every field optional, so a
//! config file only needs the values it changes.

use std::time::Duration;

use gabble_protocol::SERVER_PORT;
use serde::{Deserialize, Serialize};

/// Configuration for a [`ChatServer`](crate::ChatServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server socket to.
    ///
    /// Default: `127.0.0.1:8867`.
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{SERVER_PORT}"),
        }
    }
}

/// Configuration for a [`ChatClient`](crate::ChatClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Name to join the chat as.
    pub username: String,

    /// Local address to bind. Port `0` lets the OS pick.
    pub bind_addr: String,

    /// Address of the chat server.
    pub server_addr: String,

    /// How long to wait for the reply to JOIN, in milliseconds.
    ///
    /// `None` waits forever.
    pub join_timeout_ms: Option<u64>,
}

impl ClientConfig {
    /// The join timeout as a [`Duration`], if one is set.
    pub fn join_timeout(&self) -> Option<Duration> {
        self.join_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            bind_addr: "127.0.0.1:0".to_string(),
            server_addr: format!("127.0.0.1:{SERVER_PORT}"),
            join_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_uses_well_known_port() {
        assert_eq!(ServerConfig::default().bind_addr, "127.0.0.1:8867");
    }

    #[test]
    fn test_client_config_partial_json_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"username":"alice","join_timeout_ms":500}"#)
                .unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.bind_addr, "127.0.0.1:0");
        assert_eq!(config.server_addr, "127.0.0.1:8867");
        assert_eq!(config.join_timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_client_config_round_trips_through_json() {
        let config = ClientConfig {
            username: "bob".into(),
            ..ClientConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.join_timeout(), None);
    }
}
