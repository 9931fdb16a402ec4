//! Configuration file I/O operations

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.studyhub/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".studyhub")
    }

    /// Get the global config file path (~/.studyhub/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `path` if given, else the global config; defaults when the file
    /// does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::global_config_path);
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Write the config to `path`, replacing it in one rename.
    ///
    /// Holds an exclusive lock on `<path>.lock` while writing so two
    /// processes editing the same file cannot interleave.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        replace_locked(path, content.as_bytes())
    }

    /// Store a provider token and turn sync on
    pub fn set_access_token(&mut self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            bail!("Access token must not be empty");
        }
        self.sync.access_token = Some(token.to_string());
        self.sync.enabled = true;
        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn replace_locked(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // The lock lives beside the target; renaming over the target keeps it valid
    let lock_path = sibling(path, ".lock");
    let lock = File::create(&lock_path)
        .with_context(|| format!("Failed to open {}", lock_path.display()))?;
    lock.lock_exclusive()
        .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

    let staged = sibling(path, ".tmp");
    let written = File::create(&staged)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&staged, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&staged);
        return Err(err).with_context(|| format!("Failed to write {}", path.display()));
    }

    tracing::debug!("Saved config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub/config.toml");

        let mut config = Config::default();
        config.settings.user_id = "bia".to_string();
        config.sync.enabled = true;
        config.sync.access_token = Some("tok".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert!(!dir.path().join("sub/config.toml.tmp").exists());
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\nuser_id = \"old\"\n").unwrap();

        let mut config = Config::load(Some(&path)).unwrap();
        config.settings.user_id = "new".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap().settings.user_id, "new");
    }

    #[test]
    fn test_set_access_token_enables_sync() {
        let mut config = Config::default();
        config.set_access_token("  ya29.token  ").unwrap();
        assert!(config.sync.is_authorized());
        assert_eq!(config.sync.access_token.as_deref(), Some("ya29.token"));

        assert!(config.set_access_token("   ").is_err());
        assert_eq!(config.sync.access_token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let loaded = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\ninterval_secs = \"soon\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
