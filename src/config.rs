//! Match configuration
//!
//! Defaults follow the standard two-player rules. A JSON file can override
//! any subset of fields; CLI flags override the file.

use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub player_names: [String; 2],

    pub starting_life: i32,

    /// Opening hand size
    pub hand_size: usize,

    /// Hand size enforced during cleanup
    pub max_hand_size: usize,

    pub lands_per_turn: u8,

    /// RNG seed for shuffling and the starting player; random when absent
    pub seed: Option<u64>,

    /// How often the driver calls `update()`; 0 runs unthrottled
    pub tick_interval_ms: u64,

    /// Stop the match after this many turns (no winner)
    pub max_turns: Option<u32>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            player_names: ["Player 1".to_string(), "Player 2".to_string()],
            starting_life: 20,
            hand_size: 7,
            max_hand_size: 7,
            lands_per_turn: 1,
            seed: None,
            tick_interval_ms: 100,
            max_turns: None,
        }
    }
}

impl MatchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MatchConfig =
            serde_json::from_str(json).map_err(|e| MtgError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MtgError::ResourceNotFound(path.display().to_string()),
            _ => MtgError::IoError(e),
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.starting_life <= 0 {
            return Err(MtgError::ConfigError(format!(
                "starting_life must be positive, got {}",
                self.starting_life
            )));
        }
        if self.player_names.iter().any(|n| n.trim().is_empty()) {
            return Err(MtgError::ConfigError("player names cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.hand_size, 7);
        assert_eq!(config.max_hand_size, 7);
        assert_eq!(config.lands_per_turn, 1);
        assert_eq!(config.tick_interval_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MatchConfig::from_json(r#"{ "seed": 42, "starting_life": 30 }"#).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.starting_life, 30);
        assert_eq!(config.hand_size, 7);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = MatchConfig::from_json(r#"{ "starting_life": 0 }"#).unwrap_err();
        assert!(matches!(err, MtgError::ConfigError(_)));

        let err = MatchConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, MtgError::ConfigError(_)));
    }

    #[test]
    fn test_zero_tick_interval_is_unthrottled() {
        let config = MatchConfig::from_json(r#"{ "tick_interval_ms": 0 }"#).unwrap();
        assert_eq!(config.tick_interval_ms, 0);
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let err = MatchConfig::load_from_file("/nonexistent/match.json").unwrap_err();
        assert!(matches!(err, MtgError::ResourceNotFound(_)));
    }
}
