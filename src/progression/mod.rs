//! Gamification system: achievements, XP and levels
//!
//! Pure calculations live in `levels` and `checker`; `manager` is the only
//! part that writes.

mod checker;
mod definitions;
mod levels;
mod manager;

pub use checker::{check_achievements, condition_met, evaluate, EQUALS_PRECISION_DECIMALS};
pub use definitions::{
    Achievement, AchievementKind, Catalog, CatalogError, Comparison, Condition, Rarity,
};
pub use levels::{
    level_in, level_of, progress_of, validate_table, xp_to_next_level, Level, LevelTableError,
    PlayerStats, LEVELS,
};
pub use manager::{
    AchievementManager, GamificationEvent, LevelUp, UnlockResult, UnlockedAchievement,
};
