//! Upward interface for the UI layer
//!
//! `StudyHub` is constructed once per session and passed around by
//! reference. Every method returns a value or a typed [`CoreError`]; remote
//! problems come back as soft warnings inside the result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, NewEvent};
use crate::progression::{
    level_of, progress_of, xp_to_next_level, AchievementKind, AchievementManager, Catalog,
    GamificationEvent, Level, PlayerStats, UnlockResult, UnlockedAchievement,
};
use crate::store::{Db, EventStore, ProgressionStore, SqliteStore};
use crate::sync::{
    EventMutation, EventReconciler, HttpTaskProvider, ReconcileOutcome, SyncHandle, SyncService,
    TaskProvider,
};

/// Validate XP coming from outside the crate
fn checked_xp(xp: i64) -> CoreResult<u64> {
    u64::try_from(xp).map_err(|_| CoreError::validation(format!("XP must not be negative, got {xp}")))
}

pub struct StudyHub {
    achievements: AchievementManager,
    events: Arc<EventReconciler>,
}

impl StudyHub {
    pub fn new(
        progression: Arc<dyn ProgressionStore>,
        events: Arc<dyn EventStore>,
        catalog: Arc<Catalog>,
        provider: Option<Arc<dyn TaskProvider>>,
    ) -> Self {
        Self {
            achievements: AchievementManager::new(progression, catalog),
            events: Arc::new(EventReconciler::new(events, provider)),
        }
    }

    /// Wire up SQLite, the catalog and (when authorized) the HTTP provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config.database_path();
        let db = Db::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        let store = Arc::new(SqliteStore::new(db));

        let catalog = match &config.settings.catalog_path {
            Some(path) => Catalog::from_file(path)?,
            None => Catalog::builtin(),
        };

        let provider = HttpTaskProvider::from_settings(&config.sync)
            .map(|p| Arc::new(p) as Arc<dyn TaskProvider>);
        if config.sync.enabled && provider.is_none() {
            tracing::warn!("Sync is enabled but no access token is configured; working local-only");
        }

        Ok(Self::new(store.clone(), store, Arc::new(catalog), provider))
    }

    pub fn achievements(&self) -> &AchievementManager {
        &self.achievements
    }

    pub fn reconciler(&self) -> Arc<EventReconciler> {
        Arc::clone(&self.events)
    }

    // ========================================
    // LEVELS
    // ========================================

    pub fn get_level(&self, xp: i64) -> CoreResult<&'static Level> {
        Ok(level_of(checked_xp(xp)?))
    }

    pub fn get_progress(&self, xp: i64) -> CoreResult<u8> {
        let xp = checked_xp(xp)?;
        Ok(progress_of(xp, level_of(xp)))
    }

    pub fn get_xp_to_next_level(&self, xp: i64) -> CoreResult<u64> {
        let xp = checked_xp(xp)?;
        Ok(xp_to_next_level(xp, level_of(xp)))
    }

    pub fn player_stats(&self, user_id: &str) -> CoreResult<PlayerStats> {
        self.achievements.player_stats(user_id)
    }

    // ========================================
    // ACHIEVEMENTS
    // ========================================

    pub fn evaluate_and_unlock(
        &self,
        user_id: &str,
        kind: AchievementKind,
        measured: f64,
    ) -> CoreResult<Vec<GamificationEvent>> {
        self.achievements.evaluate_and_unlock(user_id, kind, measured)
    }

    pub fn unlock(&self, user_id: &str, achievement_id: &str) -> CoreResult<UnlockResult> {
        self.achievements.unlock(user_id, achievement_id)
    }

    pub fn award_xp(&self, user_id: &str, amount: i64) -> CoreResult<u64> {
        self.achievements.award_xp(user_id, checked_xp(amount)?)
    }

    pub fn unlocked(&self, user_id: &str) -> CoreResult<Vec<UnlockedAchievement>> {
        self.achievements.unlocked(user_id)
    }

    // ========================================
    // EVENTS
    // ========================================

    pub async fn add_event(&self, user_id: &str, event: NewEvent) -> CoreResult<EventMutation> {
        self.events.add_event(user_id, event).await
    }

    pub async fn remove_event(&self, user_id: &str, event_id: &str) -> CoreResult<EventMutation> {
        self.events.remove_event(user_id, event_id).await
    }

    pub async fn toggle_event_complete(&self, user_id: &str, event_id: &str) -> CoreResult<EventMutation> {
        self.events.toggle_event_complete(user_id, event_id).await
    }

    pub fn list_events(&self, user_id: &str) -> CoreResult<Vec<Event>> {
        self.events.list_events(user_id)
    }

    pub async fn reconcile(&self, user_id: &str) -> CoreResult<ReconcileOutcome> {
        self.events.reconcile(user_id).await
    }

    /// Start periodic reconciliation; stop it with the returned handle
    pub fn spawn_sync(&self, user_id: &str, poll_interval: Duration) -> SyncHandle {
        SyncService::spawn(self.reconciler(), user_id, poll_interval)
    }
}
