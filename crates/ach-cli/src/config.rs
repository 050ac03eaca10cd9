//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ach_core::Roots;
use ach_watch::WatchConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Directory of canonical achievement lists, one JSON file per game.
    pub metadata_dir: PathBuf,
    /// Overrides the shared public documents directory crackers write to.
    pub public_documents: Option<PathBuf>,
    /// Overrides the roaming application data directory.
    pub app_data: Option<PathBuf>,
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let watch = WatchConfig::default();
        Self {
            database_path: data_dir.join("ach.db"),
            metadata_dir: data_dir.join("metadata"),
            public_documents: None,
            app_data: None,
            debounce_ms: duration_ms(watch.debounce),
            poll_interval_ms: duration_ms(watch.poll_interval),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `config_path`,
    /// then `ACH_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("ACH_"));

        figment.extract()
    }

    /// Cracker root directories, with platform defaults for anything unset.
    pub fn roots(&self) -> Roots {
        let defaults = Roots::platform_default();
        Roots::new(
            self.public_documents
                .clone()
                .unwrap_or(defaults.public_documents),
            self.app_data.clone().unwrap_or(defaults.app_data),
        )
    }

    pub const fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Returns the platform-specific config directory for ach.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ach"))
}

/// Returns the platform-specific data directory for ach.
///
/// On Linux: `~/.local/share/ach`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ach"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_ach() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "ach");
    }

    #[test]
    fn test_default_config_uses_data_dir() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("ach.db"));
        assert_eq!(config.metadata_dir, data_dir.join("metadata"));
        assert_eq!(config.watch_config(), WatchConfig::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/custom.db\"\npublic_documents = \"/games/public\"\ndebounce_ms = 10\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.watch_config().debounce, Duration::from_millis(10));
        assert_eq!(
            config.roots().public_documents,
            PathBuf::from("/games/public")
        );
        assert_eq!(config.roots().app_data, Roots::platform_default().app_data);
    }
}
