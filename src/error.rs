//! Error taxonomy for the core
//!
//! Local failures (`CoreError`) are fatal to the operation that raised them.
//! Remote failures (`ProviderError`, see [`crate::sync::ProviderError`]) never
//! appear here: they degrade to local-only behavior and are reported inside
//! outcome values instead.

/// Failure of the local durable store
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Errors surfaced to callers of the upward interface
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Event {event_id} has a remote update in flight")]
    Busy { event_id: String },

    #[error("Event not found: {event_id}")]
    NotFound { event_id: String },
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Sqlite(err))
    }
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
