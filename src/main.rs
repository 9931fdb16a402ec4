use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use studyhub::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "studyhub")]
#[command(about = "Study companion - XP levels, achievements and calendar task sync")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.studyhub/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Act as this user instead of the configured one
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show XP, level and unlocked achievements
    Status,

    /// Show the level for an XP amount
    Level {
        /// Total XP
        #[arg(allow_negative_numbers = true)]
        xp: i64,
    },

    /// List the achievement catalog
    Achievements {
        /// Only show achievements of this type (grade, attendance, task, streak, special)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Unlock an achievement by id
    Unlock {
        achievement_id: String,
    },

    /// Record a measurement and unlock every achievement it satisfies
    Record {
        /// Achievement type (grade, attendance, task, streak, special)
        kind: String,
        /// Measured value, e.g. a grade or attendance percentage
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },

    /// Manage calendar events
    Event {
        #[command(subcommand)]
        command: cli::event::EventCommands,
    },

    /// Save the remote provider access token and enable sync
    SetToken {
        /// OAuth bearer token
        token: String,
    },

    /// Reconcile events with the remote task provider
    Sync {
        /// Keep syncing on the configured interval until Ctrl+C
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::global_config_path);

    let load = || -> Result<(Config, String)> {
        let config = Config::load(Some(&config_path))?;
        let user_id = cli
            .user
            .clone()
            .unwrap_or_else(|| config.settings.user_id.clone());
        Ok((config, user_id))
    };

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Init { force } => {
            cli::init::init_command(&config_path, force)?;
        }
        Commands::Status => {
            let (config, user_id) = load()?;
            cli::status::status_command(&config, &user_id)?;
        }
        Commands::Level { xp } => {
            cli::level::level_command(xp)?;
        }
        Commands::Achievements { kind } => {
            let (config, user_id) = load()?;
            cli::achievements::achievements_command(&config, &user_id, kind)?;
        }
        Commands::Unlock { achievement_id } => {
            let (config, user_id) = load()?;
            cli::achievements::unlock_command(&config, &user_id, &achievement_id)?;
        }
        Commands::Record { kind, value } => {
            let (config, user_id) = load()?;
            cli::achievements::record_command(&config, &user_id, &kind, value)?;
        }
        Commands::Event { command } => {
            let (config, user_id) = load()?;
            cli::event::event_command(&config, &user_id, command).await?;
        }
        Commands::SetToken { token } => {
            cli::token::set_token_command(&config_path, &token)?;
        }
        Commands::Sync { watch } => {
            let (config, user_id) = load()?;
            cli::sync::sync_command(&config, &user_id, watch).await?;
        }
    }

    Ok(())
}
