//! Configuration data models
//!
//! Every field has a default so a partial `config.json` still loads.

use crate::control::playback::{DEFAULT_INTERPRETER, MEDIA_KEY_SCRIPT, PlaybackCommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandConfig {
    /// Command used to toggle playback
    pub playback: PlaybackConfig,
    /// Log filtering and destinations
    pub logging: LoggingConfig,
}

/// How the play/pause key press is delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Script interpreter, `/usr/bin/osascript` by default
    pub interpreter: PathBuf,
    /// Script passed to the interpreter with `-e`
    pub script: String,
}

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Whether to write `island.log`
    pub log_to_file: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            script: MEDIA_KEY_SCRIPT.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl From<&PlaybackConfig> for PlaybackCommand {
    fn from(config: &PlaybackConfig) -> Self {
        PlaybackCommand::new(config.interpreter.clone(), config.script.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IslandConfig::default();
        assert_eq!(config.playback.interpreter, PathBuf::from("/usr/bin/osascript"));
        assert_eq!(config.logging.filter, "info");
        assert!(config.logging.log_to_file);
    }

    #[test]
    fn test_default_playback_matches_command_default() {
        let command = PlaybackCommand::from(&PlaybackConfig::default());
        assert_eq!(command, PlaybackCommand::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: IslandConfig =
            serde_json::from_str(r#"{ "logging": { "filter": "island=debug" } }"#).unwrap();
        assert_eq!(config.logging.filter, "island=debug");
        assert!(config.logging.log_to_file);
        assert_eq!(config.playback, PlaybackConfig::default());
    }

    #[test]
    fn test_serialization() {
        let mut config = IslandConfig::default();
        config.playback.interpreter = PathBuf::from("/opt/bin/osascript");
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: IslandConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
