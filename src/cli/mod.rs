//! CLI command implementations

pub mod achievements;
pub mod event;
pub mod init;
pub mod level;
pub mod status;
pub mod sync;
pub mod token;

use anyhow::Result;
use studyhub::config::Config;
use studyhub::StudyHub;

/// Open the hub described by the loaded config
pub(crate) fn open_hub(config: &Config) -> Result<StudyHub> {
    StudyHub::from_config(config)
}
