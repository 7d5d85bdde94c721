//! Command-line configuration.
//!
//! Loaded from `skillmint.toml` in the platform config directory, or from an
//! explicit path. A missing or unreadable file falls back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "skillmint.toml";

/// Application directory under the platform config and data dirs.
const APP_DIR: &str = "skillmint";

/// Command-line configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding progress blobs
    pub data_dir: PathBuf,
    /// Catalog file replacing the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// Seconds a notification stays visible
    pub toast_seconds: u64,
    /// Use the built-in offline content service
    pub offline_content: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_path: None,
            toast_seconds: 5,
            offline_content: true,
        }
    }
}

impl CliConfig {
    /// Load configuration from the default file location.
    /// Writes a default file there on first run.
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            return Self::load_from(path);
        }

        let config = Self::default();
        if let Err(e) = config.save_to(&path) {
            warn!("Failed to write default config: {e}");
        }
        config
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                info!("Loaded config from {}", path.display());
                config.validate();
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.toast_seconds = self.toast_seconds.clamp(1, 60);
    }

    /// Notification lifetime.
    #[must_use]
    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }
}

/// Platform data directory for progress, or `./progress` as a fallback.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("progress"))
        .unwrap_or_else(|| PathBuf::from("progress"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.toast_seconds, 5);
        assert!(config.offline_content);
        assert!(config.catalog_path.is_none());
        assert!(config.data_dir.ends_with("progress"));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("skillmint.toml");

        let config = CliConfig {
            data_dir: temp_dir.path().join("data"),
            catalog_path: Some(temp_dir.path().join("catalog.toml")),
            toast_seconds: 9,
            offline_content: true,
        };
        config.save_to(&config_path).expect("Failed to save config");

        let loaded = CliConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = CliConfig::load_from("/nonexistent/path/skillmint.toml");
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_config_partial_and_clamped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("skillmint.toml");
        fs::write(&config_path, "toast_seconds = 0\n").expect("write config");

        let config = CliConfig::load_from(&config_path);
        assert_eq!(config.toast_seconds, 1);
        assert!(config.offline_content);
    }

    #[test]
    fn test_config_invalid_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("skillmint.toml");
        fs::write(&config_path, "toast_seconds = \"soon\"").expect("write config");

        assert_eq!(CliConfig::load_from(&config_path), CliConfig::default());
    }
}
