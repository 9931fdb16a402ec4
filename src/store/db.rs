//! SQLite database connection and schema management
//!
//! Manages the `~/.studyhub/studyhub.db` database with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::PersistenceError;

/// Shared database handle
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL so the CLI and a running sync loop can share the file
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn.lock().map_err(|_| PersistenceError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), PersistenceError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        run_migrations(&conn)?;
        Ok(())
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32, PersistenceError> {
        let conn = self.conn()?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        Ok(version)
    }
}

/// Run any pending migrations
fn run_migrations(conn: &Connection) -> Result<(), PersistenceError> {
    let version: i32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
        .unwrap_or(0);

    // Migration 2: sync bookkeeping on events
    if version < 2 {
        let has_sync_state: bool = conn
            .prepare("SELECT COUNT(*) FROM pragma_table_info('events') WHERE name = 'sync_state'")
            .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
            .map(|c| c > 0)
            .unwrap_or(false);

        if !has_sync_state {
            conn.execute_batch(
                r#"
                ALTER TABLE events ADD COLUMN sync_state TEXT NOT NULL DEFAULT 'local_only';
                UPDATE events SET sync_state = 'linked' WHERE remote_task_id IS NOT NULL;
                "#,
            )?;
        }
        conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
    }

    Ok(())
}

/// SQL schema for a fresh database
const SCHEMA_SQL: &str = r#"
-- Calendar events / tasks
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    date TEXT NOT NULL,
    kind TEXT NOT NULL,
    description TEXT,
    discipline TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    remote_task_id TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_user_date ON events(user_id, date);
CREATE INDEX IF NOT EXISTS idx_events_remote ON events(user_id, remote_task_id);

-- Unlocked achievements (one row per user and achievement, never revoked)
CREATE TABLE IF NOT EXISTS achievement_unlocks (
    user_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL,
    unlocked_at INTEGER NOT NULL,
    xp_awarded INTEGER NOT NULL,
    PRIMARY KEY (user_id, achievement_id)
);

-- Per-user XP total
CREATE TABLE IF NOT EXISTS player_stats (
    user_id TEXT PRIMARY KEY,
    total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
    updated_at INTEGER
);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
