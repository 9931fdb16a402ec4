//! Init command implementation

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

/// Default configuration content for studyhub init
pub const DEFAULT_CONFIG: &str = r#"# StudyHub Configuration
# =======================

# ============================================================================
# SETTINGS
# ============================================================================
#
# Available options:
#   user_id        - Account the CLI acts as (default: "local")
#   database_path  - SQLite file (default: ~/.studyhub/studyhub.db)
#   catalog_path   - TOML achievement catalog replacing the built-in one

[settings]
user_id = "local"

# ============================================================================
# SYNC - Mirror calendar events into a remote task list
# ============================================================================
#
# Events are always stored locally first. With sync enabled and an access
# token set, new events are created as remote tasks and completion flags are
# pulled back every `interval_secs` (the remote value wins).

[sync]
enabled = false
interval_secs = 300
base_url = "https://tasks.googleapis.com/tasks/v1"
task_list = "@default"
# access_token = ""
connect_timeout_secs = 5
read_timeout_secs = 30
"#;

/// Write the default config to `config_path`
pub fn init_command(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    info!("Created config at {}", config_path.display());
    println!("Created {}", config_path.display());
    Ok(())
}
