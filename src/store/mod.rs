//! Local durable store
//!
//! The core talks to storage through two narrow traits so tests and
//! alternative backends can stand in for SQLite. Failures here are always
//! fatal to the operation in progress.
//!
//! # Usage
//!
//! ```ignore
//! let db = Db::open(&path)?;
//! let store = Arc::new(SqliteStore::new(db));
//! let total = store.add_xp("user-1", 50)?;
//! ```

mod db;
mod sqlite;

pub use db::Db;
pub use sqlite::SqliteStore;

use crate::error::PersistenceError;
use crate::events::Event;

/// A per-user achievement unlock record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockRecord {
    pub achievement_id: String,
    /// Unix timestamp in milliseconds
    pub unlocked_at: i64,
    pub xp_awarded: u64,
}

/// CRUD over calendar events, keyed by user id
pub trait EventStore: Send + Sync {
    fn insert_event(&self, event: &Event) -> Result<(), PersistenceError>;

    fn get_event(&self, user_id: &str, event_id: &str) -> Result<Option<Event>, PersistenceError>;

    /// All events of a user, ordered by date
    fn list_events(&self, user_id: &str) -> Result<Vec<Event>, PersistenceError>;

    /// Overwrite a stored event. Returns false if it no longer exists.
    fn update_event(&self, event: &Event) -> Result<bool, PersistenceError>;

    /// Returns false if there was nothing to delete
    fn delete_event(&self, user_id: &str, event_id: &str) -> Result<bool, PersistenceError>;
}

/// XP counter and unlock records, keyed by user id
pub trait ProgressionStore: Send + Sync {
    fn total_xp(&self, user_id: &str) -> Result<u64, PersistenceError>;

    /// Atomically add `amount` and return the new total.
    ///
    /// Implementations must not read-then-write: concurrent calls for the
    /// same user must all be reflected in the total.
    fn add_xp(&self, user_id: &str, amount: u64) -> Result<u64, PersistenceError>;

    fn unlocks(&self, user_id: &str) -> Result<Vec<UnlockRecord>, PersistenceError>;

    /// Record an unlock and award its XP in one atomic step.
    ///
    /// Returns `Some(new_total)` when the record was created, `None` if the
    /// achievement was already unlocked (nothing is written in that case).
    fn record_unlock(
        &self,
        user_id: &str,
        achievement_id: &str,
        xp_reward: u64,
        unlocked_at: i64,
    ) -> Result<Option<u64>, PersistenceError>;
}
