//! Level command implementation

use anyhow::Result;

use studyhub::progression::{level_of, PlayerStats, LEVELS};

/// Show where an XP amount lands in the level table
pub fn level_command(xp: i64) -> Result<()> {
    let Ok(xp) = u64::try_from(xp) else {
        anyhow::bail!("XP must not be negative, got {}", xp);
    };

    let stats = PlayerStats::new(xp);
    println!("{} XP -> level {} ({})", xp, stats.level, stats.title);
    if stats.is_max_level() {
        println!("Max level reached");
    } else {
        println!(
            "Progress: {}% ({} XP to next level)",
            stats.progress, stats.xp_to_next
        );
    }

    println!("\nLevels:");
    let current = level_of(xp).level;
    for level in LEVELS.iter() {
        let marker = if level.level == current { ">" } else { " " };
        let range = match level.max_xp {
            Some(max) => format!("{}-{}", level.min_xp, max),
            None => format!("{}+", level.min_xp),
        };
        println!("{} {:>2}  {:<13} {}", marker, level.level, level.title, range);
    }

    Ok(())
}
