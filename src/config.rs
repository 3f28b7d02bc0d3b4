//! Shell configuration stored as TOML under the user's config directory.
//!
//! ```text
//! <config_dir>/dashboard-shell/config.toml
//! ```
//!
//! A missing file yields the defaults; a malformed file is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::types::ShellError;

const APP_DIR: &str = "dashboard-shell";
const CONFIG_FILE: &str = "config.toml";

/// Default interval between scheduled subdued checks (4 hours)
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 4 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Version of the running application (semver)
    pub current_version: String,
    /// Tab titles used by "new layout"; empty means a single placeholder tab
    pub tab_titles: Vec<String>,
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Release manifest to check; updates are disabled when unset
    pub manifest_path: Option<PathBuf>,
    /// Where downloaded artifacts are stored
    pub download_dir: PathBuf,
    /// Run a subdued check when the shell starts
    pub check_on_startup: bool,
    /// Seconds between scheduled subdued checks; 0 disables them
    pub check_interval_secs: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            tab_titles: Vec::new(),
            update: UpdateConfig::default(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        let download_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
            .join("updates");

        Self {
            manifest_path: None,
            download_dir,
            check_on_startup: true,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
        }
    }
}

impl ShellConfig {
    /// `<config_dir>/dashboard-shell/config.toml`
    pub fn default_path() -> Result<PathBuf, ShellError> {
        let config_dir = dirs::config_dir().ok_or_else(|| ShellError::Config {
            message: "Could not find config directory".to_string(),
        })?;
        Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ShellError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ShellError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ShellError::Config {
                    message: format!("Failed to read config file '{}': {e}", path.display()),
                })
            }
        };

        let config: ShellConfig = toml::from_str(&content).map_err(|e| ShellError::Config {
            message: format!("Failed to parse config file '{}': {e}", path.display()),
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ShellError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ShellError::IoError {
                message: format!("Failed to create config directory: {e}"),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ShellError::Config {
            message: format!("Failed to serialize config to TOML: {e}"),
        })?;

        std::fs::write(path, content).map_err(|e| ShellError::IoError {
            message: format!("Failed to write config file: {e}"),
        })
    }

    /// Interval for scheduled checks, if enabled.
    pub fn check_interval(&self) -> Option<Duration> {
        (self.update.check_interval_secs > 0)
            .then(|| Duration::from_secs(self.update.check_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = ShellConfig::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, ShellConfig::default());
        assert!(config.update.check_on_startup);
        assert_eq!(
            config.check_interval(),
            Some(Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS))
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "current_version = \"1.2.3\"\n\n[update]\nmanifest_path = \"/srv/latest.json\"\ncheck_interval_secs = 0\n",
        )
        .unwrap();

        let config = ShellConfig::load_from(&path).unwrap();

        assert_eq!(config.current_version, "1.2.3");
        assert_eq!(
            config.update.manifest_path,
            Some(PathBuf::from("/srv/latest.json"))
        );
        assert!(config.update.check_on_startup);
        assert_eq!(config.check_interval(), None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "current_version = [").unwrap();

        let result = ShellConfig::load_from(&path);

        assert!(matches!(result, Err(ShellError::Config { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = ShellConfig::default();
        config.tab_titles = vec!["Drive".to_string(), "Vision".to_string()];

        config.save_to(&path).unwrap();

        assert_eq!(ShellConfig::load_from(&path).unwrap(), config);
    }
}
