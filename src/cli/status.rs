//! Status command implementation

use anyhow::Result;

use studyhub::config::Config;

use super::open_hub;

/// Show XP, level progress, unlocked achievements and upcoming events
pub fn status_command(config: &Config, user_id: &str) -> Result<()> {
    let hub = open_hub(config)?;
    let stats = hub.player_stats(user_id)?;

    println!("User: {}", user_id);
    println!("Level {} - {} ({} XP)", stats.level, stats.title, stats.total_xp);
    if stats.is_max_level() {
        println!("Max level reached");
    } else {
        println!(
            "Progress: {}% ({} XP to next level)",
            stats.progress, stats.xp_to_next
        );
    }

    let unlocked = hub.unlocked(user_id)?;
    let catalog = hub.achievements().catalog();
    println!("\nAchievements: {}/{}", unlocked.len(), catalog.len());
    for entry in &unlocked {
        println!(
            "  {} {} (+{} XP)",
            entry.achievement.icon, entry.achievement.title, entry.achievement.xp_reward
        );
    }

    let events = hub.list_events(user_id)?;
    let pending: Vec<_> = events.iter().filter(|e| !e.completed).collect();
    println!("\nEvents: {} ({} pending)", events.len(), pending.len());
    for event in pending.iter().take(5) {
        println!("  {} [{}] {}", event.date, event.kind.as_str(), event.title);
    }

    Ok(())
}
