//! Achievement Manager - persistence-touching gamification logic
//!
//! Handles unlocks and XP awards. Every write goes through
//! [`ProgressionStore`], which makes each unlock a single atomic step and
//! each XP award an atomic increment.

use std::sync::Arc;

use chrono::Utc;

use super::checker::check_achievements;
use super::definitions::{Achievement, AchievementKind, Catalog};
use super::levels::{level_of, PlayerStats};
use crate::error::{CoreError, CoreResult};
use crate::store::ProgressionStore;

/// An achievement that was just unlocked
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub unlocked_at: i64,
}

/// A level up event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub new_title: String,
}

impl LevelUp {
    /// Level change caused by moving from `before` to `after` XP, if any
    pub fn between(before: u64, after: u64) -> Option<Self> {
        let old = level_of(before);
        let new = level_of(after);
        (new.level > old.level).then(|| Self {
            old_level: old.level,
            new_level: new.level,
            new_title: new.title.to_string(),
        })
    }
}

/// Outcome of [`AchievementManager::unlock`]
#[derive(Debug, Clone, PartialEq)]
pub enum UnlockResult {
    Unlocked {
        unlocked: UnlockedAchievement,
        new_total: u64,
        level_up: Option<LevelUp>,
    },
    /// Already unlocked earlier: no XP awarded, no new record
    AlreadyUnlocked,
}

/// Events that can happen during gamification checks
#[derive(Debug, Clone, PartialEq)]
pub enum GamificationEvent {
    AchievementUnlocked(UnlockedAchievement),
    LevelUp(LevelUp),
    XpAwarded { amount: u64, reason: String },
}

/// Main manager for unlocks and XP
#[derive(Clone)]
pub struct AchievementManager {
    store: Arc<dyn ProgressionStore>,
    catalog: Arc<Catalog>,
}

impl AchievementManager {
    pub fn new(store: Arc<dyn ProgressionStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ========================================
    // XP & LEVEL OPERATIONS
    // ========================================

    pub fn player_stats(&self, user_id: &str) -> CoreResult<PlayerStats> {
        Ok(PlayerStats::new(self.store.total_xp(user_id)?))
    }

    /// Award XP and return the new total
    pub fn award_xp(&self, user_id: &str, amount: u64) -> CoreResult<u64> {
        if amount == 0 {
            return Err(CoreError::validation("XP award must be positive"));
        }
        let total = self.store.add_xp(user_id, amount)?;
        tracing::debug!(user_id, amount, total, "Awarded XP");
        Ok(total)
    }

    // ========================================
    // ACHIEVEMENT OPERATIONS
    // ========================================

    /// Unlocked achievements with their catalog definitions.
    ///
    /// Records whose id is no longer in the catalog are skipped.
    pub fn unlocked(&self, user_id: &str) -> CoreResult<Vec<UnlockedAchievement>> {
        let records = self.store.unlocks(user_id)?;
        Ok(records
            .into_iter()
            .filter_map(|r| {
                self.catalog.get(&r.achievement_id).map(|a| UnlockedAchievement {
                    achievement: a.clone(),
                    unlocked_at: r.unlocked_at,
                })
            })
            .collect())
    }

    pub fn unlocked_ids(&self, user_id: &str) -> CoreResult<Vec<String>> {
        Ok(self
            .store
            .unlocks(user_id)?
            .into_iter()
            .map(|r| r.achievement_id)
            .collect())
    }

    /// Unlock an achievement for a user.
    ///
    /// Idempotent: a second call returns `AlreadyUnlocked` and awards nothing.
    pub fn unlock(&self, user_id: &str, achievement_id: &str) -> CoreResult<UnlockResult> {
        let achievement = self
            .catalog
            .get(achievement_id)
            .ok_or_else(|| CoreError::validation(format!("unknown achievement: {achievement_id}")))?;
        self.unlock_achievement(user_id, achievement)
    }

    fn unlock_achievement(&self, user_id: &str, achievement: &Achievement) -> CoreResult<UnlockResult> {
        let now = Utc::now().timestamp_millis();
        let Some(new_total) =
            self.store
                .record_unlock(user_id, &achievement.id, achievement.xp_reward, now)?
        else {
            tracing::debug!(user_id, achievement = %achievement.id, "Achievement already unlocked");
            return Ok(UnlockResult::AlreadyUnlocked);
        };

        tracing::info!(
            user_id,
            achievement = %achievement.id,
            xp = achievement.xp_reward,
            total = new_total,
            "Achievement unlocked"
        );

        let before = new_total.saturating_sub(achievement.xp_reward);
        Ok(UnlockResult::Unlocked {
            unlocked: UnlockedAchievement {
                achievement: achievement.clone(),
                unlocked_at: now,
            },
            new_total,
            level_up: LevelUp::between(before, new_total),
        })
    }

    // ========================================
    // MAIN CHECK FUNCTION
    // ========================================

    /// Evaluate every achievement of `kind` against `measured` and unlock the
    /// ones whose condition now holds. Returns the resulting events.
    pub fn evaluate_and_unlock(
        &self,
        user_id: &str,
        kind: AchievementKind,
        measured: f64,
    ) -> CoreResult<Vec<GamificationEvent>> {
        if !measured.is_finite() {
            return Err(CoreError::validation(format!(
                "measured {} value must be a finite number",
                kind.as_str()
            )));
        }

        let unlocked = self.unlocked_ids(user_id)?;
        let candidates = check_achievements(self.catalog.of_kind(kind), measured, &unlocked);

        let mut events = Vec::new();
        let mut awarded = 0u64;
        let mut first_before: Option<u64> = None;
        let mut last_total = 0u64;

        for achievement in candidates {
            match self.unlock_achievement(user_id, achievement)? {
                UnlockResult::Unlocked {
                    unlocked,
                    new_total,
                    ..
                } => {
                    first_before.get_or_insert(new_total.saturating_sub(achievement.xp_reward));
                    last_total = new_total;
                    awarded += achievement.xp_reward;
                    events.push(GamificationEvent::AchievementUnlocked(unlocked));
                }
                // Lost a race with another unlock of the same achievement
                UnlockResult::AlreadyUnlocked => {}
            }
        }

        if let Some(before) = first_before {
            events.push(GamificationEvent::XpAwarded {
                amount: awarded,
                reason: format!(
                    "{} {} achievement(s)",
                    events.len(),
                    kind.as_str()
                ),
            });
            if let Some(level_up) = LevelUp::between(before, last_total) {
                tracing::info!(user_id, level = level_up.new_level, title = %level_up.new_title, "Level up");
                events.push(GamificationEvent::LevelUp(level_up));
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Db, SqliteStore};

    fn manager() -> AchievementManager {
        let store = Arc::new(SqliteStore::new(Db::open_in_memory().unwrap()));
        AchievementManager::new(store, Arc::new(Catalog::builtin()))
    }

    #[test]
    fn test_unlock_twice_awards_once() {
        let m = manager();
        let first = m.unlock("u1", "grade_perfect").unwrap();
        assert!(matches!(first, UnlockResult::Unlocked { new_total: 100, .. }));

        let second = m.unlock("u1", "grade_perfect").unwrap();
        assert_eq!(second, UnlockResult::AlreadyUnlocked);

        assert_eq!(m.player_stats("u1").unwrap().total_xp, 100);
        assert_eq!(m.unlocked("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_unlock_unknown_achievement_is_validation_error() {
        let m = manager();
        assert!(matches!(m.unlock("u1", "nope"), Err(CoreError::Validation(_))));
        assert_eq!(m.player_stats("u1").unwrap().total_xp, 0);
    }

    #[test]
    fn test_award_xp_rejects_zero() {
        let m = manager();
        assert!(matches!(m.award_xp("u1", 0), Err(CoreError::Validation(_))));
        assert_eq!(m.award_xp("u1", 90).unwrap(), 90);
        assert_eq!(m.award_xp("u1", 60).unwrap(), 150);
        let stats = m.player_stats("u1").unwrap();
        assert_eq!(stats.title, "Iniciante");
        assert_eq!(stats.progress, 33);
    }

    #[test]
    fn test_unlock_reports_level_up() {
        let m = manager();
        m.award_xp("u1", 90).unwrap();
        let UnlockResult::Unlocked { level_up, new_total, .. } = m.unlock("u1", "grade_pass").unwrap()
        else {
            panic!("expected unlock");
        };
        assert_eq!(new_total, 110);
        assert_eq!(
            level_up,
            Some(LevelUp {
                old_level: 1,
                new_level: 2,
                new_title: "Iniciante".to_string()
            })
        );
    }

    #[test]
    fn test_evaluate_and_unlock_grade_rounding() {
        for grade in [10.0, 10.04, 9.95] {
            let m = manager();
            let events = m.evaluate_and_unlock("u1", AchievementKind::Grade, grade).unwrap();
            let ids: Vec<_> = events
                .iter()
                .filter_map(|e| match e {
                    GamificationEvent::AchievementUnlocked(u) => Some(u.achievement.id.as_str()),
                    _ => None,
                })
                .collect();
            assert!(ids.contains(&"grade_perfect"), "{grade} should unlock grade_perfect");
        }

        let m = manager();
        let events = m.evaluate_and_unlock("u1", AchievementKind::Grade, 9.8).unwrap();
        assert!(!events.iter().any(|e| matches!(
            e,
            GamificationEvent::AchievementUnlocked(u) if u.achievement.id == "grade_perfect"
        )));
    }

    #[test]
    fn test_evaluate_and_unlock_is_idempotent() {
        let m = manager();
        let first = m.evaluate_and_unlock("u1", AchievementKind::Grade, 10.0).unwrap();
        // grade_pass + grade_excellent + grade_perfect, then XP and a level up
        assert_eq!(
            first
                .iter()
                .filter(|e| matches!(e, GamificationEvent::AchievementUnlocked(_)))
                .count(),
            3
        );
        assert!(first.contains(&GamificationEvent::XpAwarded {
            amount: 170,
            reason: "3 grade achievement(s)".to_string()
        }));
        assert!(first.iter().any(|e| matches!(e, GamificationEvent::LevelUp(_))));

        let second = m.evaluate_and_unlock("u1", AchievementKind::Grade, 10.0).unwrap();
        assert!(second.is_empty());
        assert_eq!(m.player_stats("u1").unwrap().total_xp, 170);
    }

    #[test]
    fn test_evaluate_and_unlock_rejects_nan() {
        let m = manager();
        assert!(matches!(
            m.evaluate_and_unlock("u1", AchievementKind::Task, f64::NAN),
            Err(CoreError::Validation(_))
        ));
    }
}
