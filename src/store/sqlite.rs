//! SQLite implementation of the store traits

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

use super::db::Db;
use super::{EventStore, ProgressionStore, UnlockRecord};
use crate::error::PersistenceError;
use crate::events::{Event, EventKind, SyncState};

/// Event and progression store backed by [`Db`]
#[derive(Clone)]
pub struct SqliteStore {
    db: Db,
}

impl SqliteStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

const EVENT_COLUMNS: &str = "id, user_id, title, date, kind, description, discipline, \
     completed, remote_task_id, sync_state, created_at, updated_at";

/// Raw column values; converted outside the rusqlite row callback so
/// malformed data surfaces as `PersistenceError::Corrupt`.
struct EventRow {
    id: String,
    user_id: String,
    title: String,
    date: String,
    kind: String,
    description: Option<String>,
    discipline: Option<String>,
    completed: bool,
    remote_task_id: Option<String>,
    sync_state: String,
    created_at: i64,
    updated_at: i64,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            date: row.get(3)?,
            kind: row.get(4)?,
            description: row.get(5)?,
            discipline: row.get(6)?,
            completed: row.get(7)?,
            remote_task_id: row.get(8)?,
            sync_state: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_event(self) -> Result<Event, PersistenceError> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|_| {
            PersistenceError::Corrupt(format!("event {} has bad date {}", self.id, self.date))
        })?;
        let kind = EventKind::parse(&self.kind).ok_or_else(|| {
            PersistenceError::Corrupt(format!("event {} has bad kind {}", self.id, self.kind))
        })?;
        let sync_state = SyncState::parse(&self.sync_state).ok_or_else(|| {
            PersistenceError::Corrupt(format!(
                "event {} has bad sync state {}",
                self.id, self.sync_state
            ))
        })?;
        Ok(Event {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            date,
            kind,
            description: self.description,
            discipline: self.discipline,
            completed: self.completed,
            remote_task_id: self.remote_task_id,
            sync_state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn xp_from_db(value: i64) -> Result<u64, PersistenceError> {
    u64::try_from(value).map_err(|_| PersistenceError::Corrupt(format!("negative XP total {value}")))
}

fn xp_to_db(value: u64) -> Result<i64, PersistenceError> {
    i64::try_from(value).map_err(|_| PersistenceError::Corrupt(format!("XP amount {value} out of range")))
}

/// Atomic upsert-increment; runs on whatever connection or transaction it is given
fn increment_xp(conn: &Connection, user_id: &str, amount: i64, now: i64) -> Result<u64, PersistenceError> {
    let total: i64 = conn.query_row(
        r#"INSERT INTO player_stats (user_id, total_xp, updated_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(user_id) DO UPDATE SET
               total_xp = total_xp + excluded.total_xp, updated_at = excluded.updated_at
           RETURNING total_xp"#,
        rusqlite::params![user_id, amount, now],
        |r| r.get(0),
    )?;
    xp_from_db(total)
}

impl EventStore for SqliteStore {
    fn insert_event(&self, event: &Event) -> Result<(), PersistenceError> {
        let conn = self.db.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO events ({EVENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            rusqlite::params![
                event.id,
                event.user_id,
                event.title,
                event.date.format("%Y-%m-%d").to_string(),
                event.kind.as_str(),
                event.description,
                event.discipline,
                event.completed,
                event.remote_task_id,
                event.sync_state.as_str(),
                event.created_at,
                event.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_event(&self, user_id: &str, event_id: &str) -> Result<Option<Event>, PersistenceError> {
        let conn = self.db.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE user_id = ?1 AND id = ?2"),
                [user_id, event_id],
                EventRow::from_row,
            )
            .optional()?;
        row.map(EventRow::into_event).transpose()
    }

    fn list_events(&self, user_id: &str) -> Result<Vec<Event>, PersistenceError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = ?1 ORDER BY date, created_at"
        ))?;
        let rows = stmt
            .query_map([user_id], EventRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(EventRow::into_event).collect()
    }

    fn update_event(&self, event: &Event) -> Result<bool, PersistenceError> {
        let conn = self.db.conn()?;
        let changed = conn.execute(
            r#"UPDATE events SET
                   title = ?3, date = ?4, kind = ?5, description = ?6, discipline = ?7,
                   completed = ?8, remote_task_id = ?9, sync_state = ?10, updated_at = ?11
               WHERE user_id = ?1 AND id = ?2"#,
            rusqlite::params![
                event.user_id,
                event.id,
                event.title,
                event.date.format("%Y-%m-%d").to_string(),
                event.kind.as_str(),
                event.description,
                event.discipline,
                event.completed,
                event.remote_task_id,
                event.sync_state.as_str(),
                event.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_event(&self, user_id: &str, event_id: &str) -> Result<bool, PersistenceError> {
        let conn = self.db.conn()?;
        let changed = conn.execute(
            "DELETE FROM events WHERE user_id = ?1 AND id = ?2",
            [user_id, event_id],
        )?;
        Ok(changed > 0)
    }
}

impl ProgressionStore for SqliteStore {
    fn total_xp(&self, user_id: &str) -> Result<u64, PersistenceError> {
        let conn = self.db.conn()?;
        let xp: Option<i64> = conn
            .query_row(
                "SELECT total_xp FROM player_stats WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )
            .optional()?;
        xp.map(xp_from_db).transpose().map(|xp| xp.unwrap_or(0))
    }

    fn add_xp(&self, user_id: &str, amount: u64) -> Result<u64, PersistenceError> {
        let amount = xp_to_db(amount)?;
        let conn = self.db.conn()?;
        increment_xp(&conn, user_id, amount, chrono::Utc::now().timestamp_millis())
    }

    fn unlocks(&self, user_id: &str) -> Result<Vec<UnlockRecord>, PersistenceError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT achievement_id, unlocked_at, xp_awarded FROM achievement_unlocks \
             WHERE user_id = ?1 ORDER BY unlocked_at, achievement_id",
        )?;
        let rows = stmt
            .query_map([user_id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(achievement_id, unlocked_at, xp)| {
                Ok(UnlockRecord {
                    achievement_id,
                    unlocked_at,
                    xp_awarded: xp_from_db(xp)?,
                })
            })
            .collect()
    }

    fn record_unlock(
        &self,
        user_id: &str,
        achievement_id: &str,
        xp_reward: u64,
        unlocked_at: i64,
    ) -> Result<Option<u64>, PersistenceError> {
        let reward = xp_to_db(xp_reward)?;
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO achievement_unlocks (user_id, achievement_id, unlocked_at, xp_awarded) \
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, achievement_id, unlocked_at, reward],
        )?;
        if inserted == 0 {
            // Already unlocked, nothing written
            return Ok(None);
        }

        let total = increment_xp(&tx, user_id, reward, unlocked_at)?;
        tx.commit()?;
        Ok(Some(total))
    }
}
