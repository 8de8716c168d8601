//! Configuration manager for loading and saving `config.json`

use crate::config::models::IslandConfig;
use crate::error::{IslandError, Result, StringError};
use crate::utils::paths;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// How a configuration was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigStatus {
    /// Parsed from the file
    Loaded,
    /// No file; defaults in use
    Missing,
    /// The file did not parse; defaults in use
    Corrupt(String),
}

/// Configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Effective configuration
    pub config: IslandConfig,
    /// File that was read
    pub path: PathBuf,
    /// Outcome of reading `path`
    pub status: ConfigStatus,
}

impl LoadedConfig {
    /// Log how the configuration was obtained
    pub fn log_status(&self) {
        match &self.status {
            ConfigStatus::Loaded => info!("Configuration loaded from {}", self.path.display()),
            ConfigStatus::Missing => info!("Configuration file not found, using defaults"),
            ConfigStatus::Corrupt(e) => {
                warn!("Failed to parse {}, using defaults: {}", self.path.display(), e);
            }
        }
    }
}

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Path to the configuration file
    ///
    /// Returns: `<config dir>/Island/config.json`
    pub fn get_config_path() -> PathBuf {
        paths::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Load configuration from the default location
    pub fn load() -> Result<IslandConfig> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from `path`
    ///
    /// A missing or unparsable file yields the default configuration. Only
    /// I/O errors other than "not found" are returned.
    pub fn load_from(path: &Path) -> Result<IslandConfig> {
        let loaded = Self::read(path)?;
        loaded.log_status();
        Ok(loaded.config)
    }

    /// Read configuration from `path` without logging
    ///
    /// Startup reads the file before any log subscriber exists, so the outcome
    /// is kept in [`LoadedConfig::status`] and reported with
    /// [`LoadedConfig::log_status`] once logging is up.
    pub fn read(path: &Path) -> Result<LoadedConfig> {
        let (config, status) = match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => (config, ConfigStatus::Loaded),
                Err(e) => (IslandConfig::default(), ConfigStatus::Corrupt(e.to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (IslandConfig::default(), ConfigStatus::Missing)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(LoadedConfig {
            config,
            path: path.to_path_buf(),
            status,
        })
    }

    /// Save configuration to the default location
    pub fn save(config: &IslandConfig) -> Result<PathBuf> {
        let path = Self::get_config_path();
        Self::save_to(config, &path)?;
        Ok(path)
    }

    /// Save configuration to `path` with an atomic write
    ///
    /// The JSON is written to a temporary file in the same directory and
    /// renamed over `path`, so readers never observe a partial file.
    pub fn save_to(config: &IslandConfig, path: &Path) -> Result<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| IslandError::ConfigError(StringError::new("Invalid config path")))?;
        std::fs::create_dir_all(config_dir)?;

        let json = serde_json::to_string_pretty(config)?;
        let mut temp = tempfile::NamedTempFile::new_in(config_dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path)
            .map_err(|e| IslandError::ConfigError(Box::new(e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{IslandHomeGuard, create_test_dir};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Collects formatted log output for assertions
    #[derive(Clone)]
    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedWriter {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_config_path() {
        let temp_dir = create_test_dir();
        let _guard = IslandHomeGuard::new(&temp_dir);

        let path = ConfigManager::get_config_path();
        assert_eq!(path, temp_dir.path().join("Island").join("config.json"));
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = create_test_dir();
        let config = ConfigManager::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, IslandConfig::default());
    }

    #[test]
    fn test_load_corrupt_config_uses_defaults() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = ConfigManager::load_from(&path).unwrap();
        assert_eq!(config, IslandConfig::default());
    }

    #[test]
    fn test_read_reports_corrupt_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = ConfigManager::read(&path).unwrap();
        assert_eq!(loaded.config, IslandConfig::default());
        assert!(matches!(loaded.status, ConfigStatus::Corrupt(_)));
        assert_eq!(loaded.path, path);

        let missing = ConfigManager::read(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(missing.status, ConfigStatus::Missing);
    }

    #[test]
    fn test_corrupt_warning_logged_after_subscriber_exists() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        // Read with no subscriber installed, as startup does
        let loaded = ConfigManager::read(&path).unwrap();

        let output = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(CapturedWriter(Arc::clone(&output)))
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || loaded.log_status());

        let logged = String::from_utf8(output.lock().clone()).unwrap();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("Failed to parse"), "{logged}");
        assert!(logged.contains("config.json"), "{logged}");
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = create_test_dir();
        let _guard = IslandHomeGuard::new(&temp_dir);

        let mut config = IslandConfig::default();
        config.logging.filter = "island=trace".to_string();
        config.logging.log_to_file = false;

        let path = ConfigManager::save(&config).unwrap();
        assert!(path.exists());
        assert_eq!(ConfigManager::load().unwrap(), config);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("nested").join("config.json");

        ConfigManager::save_to(&IslandConfig::default(), &path).unwrap();
        ConfigManager::save_to(&IslandConfig::default(), &path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("config.json")]);
    }
}
