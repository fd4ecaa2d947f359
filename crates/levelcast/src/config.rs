//! Server configuration.
//!
//! Every struct is `#[serde(default)]`, so a config file only needs the
//! fields it changes:
//!
//! ```json
//! {
//!     "bind": "0.0.0.0:23973",
//!     "session": { "max_username_len": 24 },
//!     "room": { "max_occupants": 64 },
//!     "stats_interval_secs": 30,
//!     "send_queue_len": 512
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use levelcast_room::RoomConfig;
use levelcast_transport::DEFAULT_SEND_QUEUE;
use serde::{Deserialize, Serialize};

use crate::LevelcastError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 23973;

/// Per-player limits enforced by the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest accepted username, in UTF-8 bytes.
    ///
    /// Default: 32. A longer USERNAME is dropped and the cached name
    /// keeps its previous value.
    pub max_username_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_username_len: 32,
        }
    }
}

/// Everything the relay can be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub bind: String,

    pub session: SessionConfig,

    pub room: RoomConfig,

    /// Seconds between stats log lines. 0 disables them.
    pub stats_interval_secs: u64,

    /// Outgoing messages queued per connection before new ones are
    /// dropped for that connection.
    pub send_queue_len: usize,
}

impl ServerConfig {
    /// Reads a JSON config file.
    ///
    /// # Errors
    /// [`LevelcastError::ConfigIo`] if the file can't be read,
    /// [`LevelcastError::ConfigParse`] if it isn't a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelcastError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LevelcastError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LevelcastError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The stats interval, or `None` when stats are off.
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }

    /// Replaces the port in [`bind`](Self::bind), keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = match self.bind.rsplit_once(':') {
            Some((host, _)) => host,
            None => self.bind.as_str(),
        };
        self.bind = format!("{host}:{port}");
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            session: SessionConfig::default(),
            room: RoomConfig::default(),
            stats_interval_secs: 60,
            send_queue_len: DEFAULT_SEND_QUEUE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_all_interfaces_on_default_port() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:23973");
        assert_eq!(config.session.max_username_len, 32);
        assert_eq!(config.room.max_occupants, 0);
        assert_eq!(config.stats_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.send_queue_len, 256);
    }

    #[test]
    fn test_deserialize_partial_file_keeps_other_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"room": {"max_occupants": 8}, "stats_interval_secs": 0}"#)
                .unwrap();

        assert_eq!(config.room.max_occupants, 8);
        assert_eq!(config.stats_interval(), None);
        assert_eq!(config.bind, ServerConfig::default().bind);
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.send_queue_len, DEFAULT_SEND_QUEUE);
    }

    #[test]
    fn test_set_port_keeps_host() {
        let mut config = ServerConfig {
            bind: "127.0.0.1:80".into(),
            ..ServerConfig::default()
        };
        config.set_port(9000);
        assert_eq!(config.bind, "127.0.0.1:9000");

        config.bind = "[::1]:80".into();
        config.set_port(1);
        assert_eq!(config.bind, "[::1]:1");
    }

    #[test]
    fn test_load_missing_file_returns_config_io() {
        let result = ServerConfig::load("/definitely/not/here/levelcast.json");
        assert!(matches!(result, Err(LevelcastError::ConfigIo { .. })));
    }

    #[test]
    fn test_load_reads_json_file() {
        let path = std::env::temp_dir().join(format!("levelcast-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"bind": "127.0.0.1:4000"}"#).unwrap();

        let config = ServerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bind, "127.0.0.1:4000");
    }

    #[test]
    fn test_load_invalid_json_returns_config_parse() {
        let path = std::env::temp_dir().join(format!("levelcast-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();

        let result = ServerConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(LevelcastError::ConfigParse { .. })));
    }
}
