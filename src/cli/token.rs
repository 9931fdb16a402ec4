//! Set-token command implementation

use anyhow::Result;
use std::path::Path;
use tracing::info;

use studyhub::config::Config;

/// Store the provider access token in the config file and enable sync
pub fn set_token_command(config_path: &Path, token: &str) -> Result<()> {
    let mut config = Config::load(Some(config_path))?;
    config.set_access_token(token)?;
    config.save(config_path)?;

    info!("Stored access token in {}", config_path.display());
    println!("Sync enabled, token saved to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::init::init_command;
    use tempfile::tempdir;

    #[test]
    fn test_token_is_persisted_and_other_settings_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[settings]\nuser_id = \"ana\"\n\n[sync]\ninterval_secs = 60\n",
        )
        .unwrap();

        set_token_command(&path, "ya29.abc").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.sync.is_authorized());
        assert_eq!(config.sync.access_token.as_deref(), Some("ya29.abc"));
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(config.settings.user_id, "ana");
    }

    #[test]
    fn test_token_creates_missing_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        set_token_command(&path, "tok").unwrap();
        assert!(Config::load(Some(&path)).unwrap().sync.is_authorized());
    }

    #[test]
    fn test_empty_token_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        init_command(&path, false).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(set_token_command(&path, " ").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
