//! Achievement commands: catalog listing, manual unlock and measurements

use anyhow::{anyhow, Result};
use std::collections::HashSet;

use studyhub::config::Config;
use studyhub::progression::{AchievementKind, GamificationEvent, UnlockResult};

use super::open_hub;

fn parse_kind(kind: &str) -> Result<AchievementKind> {
    AchievementKind::parse(kind).ok_or_else(|| {
        let known: Vec<_> = AchievementKind::all().iter().map(|k| k.as_str()).collect();
        anyhow!("Unknown achievement type '{}'. Expected one of: {}", kind, known.join(", "))
    })
}

/// List the catalog, marking what the user already unlocked
pub fn achievements_command(config: &Config, user_id: &str, kind: Option<String>) -> Result<()> {
    let kind = kind.as_deref().map(parse_kind).transpose()?;
    let hub = open_hub(config)?;
    let unlocked: HashSet<String> = hub
        .unlocked(user_id)?
        .into_iter()
        .map(|u| u.achievement.id)
        .collect();

    let catalog = hub.achievements().catalog();
    for achievement in catalog.iter() {
        if kind.is_some_and(|k| k != achievement.kind) {
            continue;
        }
        let mark = if unlocked.contains(&achievement.id) { "x" } else { " " };
        println!(
            "[{}] {} {:<24} {:<9} {:>4} XP  {}",
            mark,
            achievement.icon,
            achievement.id,
            achievement.rarity.label(),
            achievement.xp_reward,
            achievement.description
        );
    }

    Ok(())
}

/// Unlock one achievement by id
pub fn unlock_command(config: &Config, user_id: &str, achievement_id: &str) -> Result<()> {
    let hub = open_hub(config)?;
    match hub.unlock(user_id, achievement_id)? {
        UnlockResult::Unlocked {
            unlocked,
            new_total,
            level_up,
        } => {
            println!(
                "Unlocked {} {} (+{} XP, total {})",
                unlocked.achievement.icon,
                unlocked.achievement.title,
                unlocked.achievement.xp_reward,
                new_total
            );
            if let Some(level_up) = level_up {
                println!("Level up! {} -> {} ({})", level_up.old_level, level_up.new_level, level_up.new_title);
            }
        }
        UnlockResult::AlreadyUnlocked => {
            println!("Achievement '{}' was already unlocked", achievement_id);
        }
    }
    Ok(())
}

/// Evaluate a measurement against every achievement of its type
pub fn record_command(config: &Config, user_id: &str, kind: &str, value: f64) -> Result<()> {
    let kind = parse_kind(kind)?;
    let hub = open_hub(config)?;
    let events = hub.evaluate_and_unlock(user_id, kind, value)?;

    if events.is_empty() {
        println!("No new achievements for {} {}", kind.as_str(), value);
        return Ok(());
    }

    for event in events {
        match event {
            GamificationEvent::AchievementUnlocked(unlocked) => {
                println!("Unlocked {} {}", unlocked.achievement.icon, unlocked.achievement.title);
            }
            GamificationEvent::XpAwarded { amount, reason } => {
                println!("+{} XP for {}", amount, reason);
            }
            GamificationEvent::LevelUp(level_up) => {
                println!("Level up! {} -> {} ({})", level_up.old_level, level_up.new_level, level_up.new_title);
            }
        }
    }
    Ok(())
}
