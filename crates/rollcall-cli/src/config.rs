//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use rollcall_core::{ExpanderConfig, ScanConfig};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Minutes before the scheduled start that a tag scan may check in.
    pub early_window_minutes: i64,
    /// Upper bound on occurrences one template may expand into.
    pub max_occurrences: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("early_window_minutes", &self.early_window_minutes)
            .field("max_occurrences", &self.max_occurrences)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("rollcall.db"),
            early_window_minutes: 30,
            max_occurrences: 365,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ROLLCALL_*)
        figment = figment.merge(Env::prefixed("ROLLCALL_"));

        figment.extract()
    }

    /// The scan-window configuration derived from this config.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            early_window: chrono::Duration::minutes(self.early_window_minutes),
        }
    }

    /// The expansion-cap configuration derived from this config.
    #[must_use]
    pub const fn expander_config(&self) -> ExpanderConfig {
        ExpanderConfig {
            max_occurrences: self.max_occurrences,
        }
    }
}

/// Returns the platform-specific config directory for rollcall.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rollcall"))
}

/// Returns the platform-specific data directory for rollcall.
///
/// On Linux: `~/.local/share/rollcall`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("rollcall"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_returns_some() {
        assert!(dirs_data_path().is_some());
    }

    #[test]
    fn test_dirs_data_path_ends_with_rollcall() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "rollcall");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("rollcall.db"));
    }

    #[test]
    fn test_default_scan_window_is_thirty_minutes() {
        let config = Config::default();
        assert_eq!(
            config.scan_config().early_window,
            chrono::Duration::minutes(30)
        );
        assert_eq!(config.expander_config().max_occurrences, 365);
    }
}
