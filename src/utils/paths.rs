//! Per-user storage locations
//!
//! Configuration lives under the platform config directory and logs under the
//! local data directory, both in an `Island` subdirectory. Setting
//! `ISLAND_HOME` moves both under a single root, which tests and portable
//! installs rely on.

use std::path::PathBuf;

/// Environment variable that overrides every per-user directory
pub const HOME_OVERRIDE_VAR: &str = "ISLAND_HOME";

/// Application directory name
pub const APP_DIR_NAME: &str = "Island";

fn home_override() -> Option<PathBuf> {
    std::env::var_os(HOME_OVERRIDE_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Directory holding `config.json`
///
/// `$ISLAND_HOME/Island`, else `~/Library/Application Support/Island` on
/// macOS (platform equivalent elsewhere), else `./Island`.
pub fn config_dir() -> PathBuf {
    home_override()
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Directory holding `island.log` and its rotated predecessors
pub fn log_dir() -> PathBuf {
    home_override()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{IslandHomeGuard, create_test_dir};

    #[test]
    fn test_override_moves_config_and_logs() {
        let temp_dir = create_test_dir();
        let _guard = IslandHomeGuard::new(&temp_dir);

        assert_eq!(config_dir(), temp_dir.path().join("Island"));
        assert_eq!(log_dir(), temp_dir.path().join("Island").join("logs"));
    }

    #[test]
    fn test_directories_end_with_app_name() {
        let temp_dir = create_test_dir();
        let _guard = IslandHomeGuard::new(&temp_dir);

        assert!(config_dir().ends_with(APP_DIR_NAME));
        assert!(log_dir().ends_with("Island/logs"));
    }
}
