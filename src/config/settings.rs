//! Settings configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Account the CLI acts as
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// SQLite database location (defaults to ~/.studyhub/studyhub.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Optional TOML achievement catalog replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            database_path: None,
            catalog_path: None,
        }
    }
}

/// Remote task provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Sync with the remote provider at all
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between reconciliation passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Provider API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Remote task list to mirror events into
    #[serde(default = "default_task_list")]
    pub task_list: String,

    /// OAuth bearer token. Sync is treated as unauthorized without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_base_url() -> String {
    "https://tasks.googleapis.com/tasks/v1".to_string()
}

fn default_task_list() -> String {
    "@default".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_secs() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            base_url: default_base_url(),
            task_list: default_task_list(),
            access_token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl SyncSettings {
    /// Enabled and holding a non-empty token
    pub fn is_authorized(&self) -> bool {
        self.enabled
            && self
                .access_token
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
    }

    /// Never zero, so a misconfigured file cannot spin the sync loop
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
