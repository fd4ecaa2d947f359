//! Room configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room.
///
/// `#[serde(default)]` lets a config file set only the fields it cares
/// about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Maximum occupants per room (0 = unlimited).
    pub max_occupants: usize,
}

impl RoomConfig {
    /// Returns `true` if a room with `occupants` players can take one more.
    pub fn has_space(&self, occupants: usize) -> bool {
        self.max_occupants == 0 || occupants < self.max_occupants
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_occupants: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let config = RoomConfig::default();
        assert!(config.has_space(0));
        assert!(config.has_space(10_000));
    }

    #[test]
    fn test_has_space_respects_limit() {
        let config = RoomConfig { max_occupants: 2 };
        assert!(config.has_space(1));
        assert!(!config.has_space(2));
    }

    #[test]
    fn test_deserialize_missing_fields_use_defaults() {
        let config: RoomConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RoomConfig::default());

        let config: RoomConfig = serde_json::from_str(r#"{"max_occupants": 16}"#).unwrap();
        assert_eq!(config.max_occupants, 16);
    }
}
