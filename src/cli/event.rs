//! Event command implementations

use anyhow::{anyhow, Result};
use clap::Subcommand;

use studyhub::config::Config;
use studyhub::events::{parse_date, Event, EventKind, NewEvent};
use studyhub::sync::EventMutation;

use super::open_hub;

#[derive(Subcommand)]
pub enum EventCommands {
    /// Create an event (and its remote task when sync is configured)
    Add {
        title: String,

        /// Date as YYYY-MM-DD
        #[arg(short, long)]
        date: String,

        /// Prova, Trabalho, Projeto, Aula or Outro
        #[arg(short, long, default_value = "Outro")]
        kind: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        discipline: Option<String>,
    },

    /// List events ordered by date
    List {
        /// Only show events not yet completed
        #[arg(long)]
        pending_only: bool,
    },

    /// Flip the completed flag of an event
    Toggle { id: String },

    /// Delete an event (and its remote task)
    Remove { id: String },
}

pub async fn event_command(config: &Config, user_id: &str, command: EventCommands) -> Result<()> {
    let hub = open_hub(config)?;

    match command {
        EventCommands::Add {
            title,
            date,
            kind,
            description,
            discipline,
        } => {
            let kind = EventKind::parse(&kind).ok_or_else(|| anyhow!("Unknown event kind '{}'", kind))?;
            let mut new = NewEvent::new(title, parse_date(&date)?, kind);
            new.description = description;
            new.discipline = discipline;

            let created = hub.add_event(user_id, new).await?;
            println!("Created {}", created.event.id);
            report(&created);
        }
        EventCommands::List { pending_only } => {
            let events = hub.list_events(user_id)?;
            let shown: Vec<&Event> = events
                .iter()
                .filter(|e| !pending_only || !e.completed)
                .collect();
            if shown.is_empty() {
                println!("No events found.");
                return Ok(());
            }
            for event in shown {
                print_event(event);
            }
        }
        EventCommands::Toggle { id } => {
            let toggled = hub.toggle_event_complete(user_id, &id).await?;
            let state = if toggled.event.completed { "completed" } else { "pending" };
            println!("{} is now {}", toggled.event.title, state);
            report(&toggled);
        }
        EventCommands::Remove { id } => {
            let removed = hub.remove_event(user_id, &id).await?;
            println!("Removed {}", removed.event.title);
            report(&removed);
        }
    }

    Ok(())
}

fn report(mutation: &EventMutation) {
    if let Some(warning) = mutation.remote.warning() {
        eprintln!("Warning: {}", warning);
    }
}

fn print_event(event: &Event) {
    let mark = if event.completed { "x" } else { " " };
    println!(
        "[{}] {} {:<8} {}  ({}, {})",
        mark,
        event.date,
        event.kind.as_str(),
        event.title,
        event.id,
        event.sync_state.as_str()
    );
    if let Some(discipline) = &event.discipline {
        println!("    {}", discipline);
    }
}
