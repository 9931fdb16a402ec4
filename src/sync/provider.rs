//! Remote task provider interface

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::events::Event;

/// Remote provider failure. Always non-fatal for the core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider authorization expired")]
    AuthExpired,

    #[error("Provider quota exceeded or rate limited")]
    Quota,

    #[error("Unexpected provider response: {0}")]
    Protocol(String),
}

/// A task as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTask {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    pub completed: bool,
    pub due: Option<NaiveDate>,
}

/// Payload for creating the remote counterpart of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteTask {
    pub title: String,
    pub notes: Option<String>,
    pub due: NaiveDate,
    pub completed: bool,
}

impl NewRemoteTask {
    pub fn from_event(event: &Event) -> Self {
        let notes = match (&event.discipline, &event.description) {
            (Some(d), Some(desc)) => Some(format!("{d}\n\n{desc}")),
            (Some(d), None) => Some(d.clone()),
            (None, desc) => desc.clone(),
        };
        Self {
            title: format!("[{}] {}", event.kind.as_str(), event.title),
            notes,
            due: event.date,
            completed: event.completed,
        }
    }
}

/// Partial update of a remote task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl RemoteTaskPatch {
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// External task/calendar service the core mirrors events into
#[async_trait]
pub trait TaskProvider: Send + Sync {
    /// Create a task and return its remote id
    async fn create_task(&self, task: &NewRemoteTask) -> Result<String, ProviderError>;

    async fn update_task(&self, remote_id: &str, patch: &RemoteTaskPatch) -> Result<(), ProviderError>;

    /// Deleting a task that is already gone succeeds
    async fn delete_task(&self, remote_id: &str) -> Result<(), ProviderError>;

    /// Every task in the mirrored list, completed ones included
    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, ProviderError>;
}
