//! Event/task synchronization with a remote task provider
//!
//! ```text
//!   add / toggle / remove          periodic pull
//!          │                             │
//!          ▼                             ▼
//!   EventReconciler ──local first──▶ EventStore (SQLite)
//!          │
//!          └──best effort──▶ TaskProvider (HTTP)
//! ```

mod http;
mod provider;
mod reconciler;
mod service;

pub use http::HttpTaskProvider;
pub use provider::{NewRemoteTask, ProviderError, RemoteTask, RemoteTaskPatch, TaskProvider};
pub use reconciler::{
    EventMutation, EventReconciler, ReconcileOutcome, ReconcileReport, RemoteOutcome,
};
pub use service::{SyncHandle, SyncService};
