//! Configuration loading and management

mod io;
mod settings;

pub use settings::{Settings, SyncSettings};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure (`~/.studyhub/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Remote task provider synchronization
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Config {
    /// Database file, falling back to `~/.studyhub/studyhub.db`
    pub fn database_path(&self) -> PathBuf {
        self.settings
            .database_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("studyhub.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sync.interval_secs, 300);
        assert!(!config.sync.enabled);
        assert_eq!(config.settings.user_id, "local");
    }

    #[test]
    fn test_partial_sync_section() {
        let config: Config = toml::from_str(
            r#"
[settings]
user_id = "ana"
database_path = "/tmp/ana.db"

[sync]
enabled = true
access_token = "secret"
interval_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.settings.user_id, "ana");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/ana.db"));
        assert!(config.sync.is_authorized());
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(config.sync.task_list, "@default");
    }
}
