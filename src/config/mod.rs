//! Configuration management module
//!
//! Loads `config.json` from the per-user config directory. The file is only
//! ever read at startup; `island config init` is the one writer, and it writes
//! atomically.

pub mod manager;
pub mod models;

pub use manager::{ConfigManager, ConfigStatus, LoadedConfig};
pub use models::{IslandConfig, LoggingConfig, PlaybackConfig};
