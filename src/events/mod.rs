//! Calendar events / tasks
//!
//! Local records are the source of truth for existence. A record may be
//! linked to a remote task through `remote_task_id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Kind of calendar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Prova,
    Trabalho,
    Projeto,
    Aula,
    Outro,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prova => "Prova",
            Self::Trabalho => "Trabalho",
            Self::Projeto => "Projeto",
            Self::Aula => "Aula",
            Self::Outro => "Outro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "prova" => Some(Self::Prova),
            "trabalho" => Some(Self::Trabalho),
            "projeto" => Some(Self::Projeto),
            "aula" => Some(Self::Aula),
            "outro" => Some(Self::Outro),
            _ => None,
        }
    }
}

/// Where an event stands relative to the remote task provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    /// No remote counterpart
    LocalOnly,
    /// Persisted locally, remote creation outstanding
    PendingRemoteCreate,
    /// Has a remote counterpart
    Linked,
    /// Being deleted, remote delete outstanding
    PendingRemoteDelete,
    /// Was linked, but the remote task disappeared
    Orphaned,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalOnly => "local_only",
            Self::PendingRemoteCreate => "pending_remote_create",
            Self::Linked => "linked",
            Self::PendingRemoteDelete => "pending_remote_delete",
            Self::Orphaned => "orphaned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local_only" => Some(Self::LocalOnly),
            "pending_remote_create" => Some(Self::PendingRemoteCreate),
            "linked" => Some(Self::Linked),
            "pending_remote_delete" => Some(Self::PendingRemoteDelete),
            "orphaned" => Some(Self::Orphaned),
            _ => None,
        }
    }
}

/// A persisted calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub kind: EventKind,
    pub description: Option<String>,
    pub discipline: Option<String>,
    pub completed: bool,
    pub remote_task_id: Option<String>,
    pub sync_state: SyncState,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

impl Event {
    /// Linked events propagate changes to the provider
    pub fn is_linked(&self) -> bool {
        self.sync_state == SyncState::Linked && self.remote_task_id.is_some()
    }
}

/// User input for a new event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub kind: EventKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discipline: Option<String>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, date: NaiveDate, kind: EventKind) -> Self {
        Self {
            title: title.into(),
            date,
            kind,
            description: None,
            discipline: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = Some(discipline.into());
        self
    }

    /// Reject input that must never reach the store
    pub fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("event title must not be empty"));
        }
        Ok(())
    }

    /// Build the local record. New events always start incomplete.
    pub fn into_event(self, user_id: &str, now_ms: i64) -> Event {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: self.title.trim().to_string(),
            date: self.date,
            kind: self.kind,
            description: normalize_optional(self.description),
            discipline: normalize_optional(self.discipline),
            completed: false,
            remote_task_id: None,
            sync_state: SyncState::LocalOnly,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::validation(format!("invalid date '{s}', expected YYYY-MM-DD")))
}
