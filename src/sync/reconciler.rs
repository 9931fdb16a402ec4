//! Event reconciler - keeps local events and remote tasks in step
//!
//! Local storage is the source of truth for existence. Every remote call is
//! best effort: a `ProviderError` is logged, reported in the outcome, and
//! never aborts the local mutation. Local store failures are returned as
//! `CoreError` and abort the operation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::provider::{NewRemoteTask, ProviderError, RemoteTaskPatch, TaskProvider};
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, NewEvent, SyncState};
use crate::store::EventStore;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// What happened on the remote side of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Remote counterpart created, updated or deleted
    Synced,
    /// No remote call was needed (not linked, or no provider)
    Skipped,
    /// Remote call failed; local state kept
    Failed(ProviderError),
}

impl RemoteOutcome {
    /// Soft warning for the UI, if any
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Failed(err) => Some(format!("Saved locally, remote sync failed: {err}")),
            _ => None,
        }
    }
}

/// Result of a create or toggle
#[derive(Debug, Clone, PartialEq)]
pub struct EventMutation {
    pub event: Event,
    pub remote: RemoteOutcome,
}

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Tasks returned by the provider
    pub pulled: usize,
    /// Local events whose completion flag was overwritten by the remote one
    pub updated: usize,
    /// Linked events whose remote task disappeared
    pub orphaned: usize,
    /// Orphaned events whose remote task showed up again
    pub relinked: usize,
    /// Events skipped because a mutation was in flight or finished during the pass
    pub deferred: usize,
    /// Events stranded mid-create or mid-delete by an earlier failure, now settled
    pub recovered: usize,
}

/// Outcome of [`EventReconciler::reconcile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed(ReconcileReport),
    /// Another pass was already running
    Skipped,
    /// No provider configured
    NoProvider,
    /// Provider could not be reached this cycle; retried on the next tick
    ProviderUnavailable(ProviderError),
}

/// Per-event mutation bookkeeping
#[derive(Default)]
struct EventGuards {
    in_flight: HashSet<String>,
    /// Events whose mutation finished since the current pass started
    touched: HashSet<String>,
}

/// Marks an event as having a mutation in flight until dropped
struct InFlightGuard<'a> {
    guards: &'a Mutex<EventGuards>,
    event_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        guards.in_flight.remove(&self.event_id);
        guards.touched.insert(std::mem::take(&mut self.event_id));
    }
}

/// Clears the reconciling flag when the pass ends, however it ends
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Local-first event operations with best-effort remote mirroring
pub struct EventReconciler {
    store: Arc<dyn EventStore>,
    provider: Option<Arc<dyn TaskProvider>>,
    guards: Mutex<EventGuards>,
    reconciling: AtomicBool,
}

impl EventReconciler {
    pub fn new(store: Arc<dyn EventStore>, provider: Option<Arc<dyn TaskProvider>>) -> Self {
        Self {
            store,
            provider,
            guards: Mutex::new(EventGuards::default()),
            reconciling: AtomicBool::new(false),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Reject a second mutation of the same event while one is outstanding
    fn begin(&self, event_id: &str) -> CoreResult<InFlightGuard<'_>> {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        if !guards.in_flight.insert(event_id.to_string()) {
            return Err(CoreError::Busy {
                event_id: event_id.to_string(),
            });
        }
        Ok(InFlightGuard {
            guards: &self.guards,
            event_id: event_id.to_string(),
        })
    }

    /// Forget mutations finished before this point
    fn reset_touched(&self) {
        self.guards
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .touched
            .clear();
    }

    fn touched_during_pass(&self, event_id: &str) -> bool {
        self.guards
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .touched
            .contains(event_id)
    }

    fn load(&self, user_id: &str, event_id: &str) -> CoreResult<Event> {
        self.store
            .get_event(user_id, event_id)?
            .ok_or_else(|| CoreError::NotFound {
                event_id: event_id.to_string(),
            })
    }

    fn save(&self, event: &Event) -> CoreResult<()> {
        if self.store.update_event(event)? {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                event_id: event.id.clone(),
            })
        }
    }

    pub fn list_events(&self, user_id: &str) -> CoreResult<Vec<Event>> {
        Ok(self.store.list_events(user_id)?)
    }

    pub fn get_event(&self, user_id: &str, event_id: &str) -> CoreResult<Event> {
        self.load(user_id, event_id)
    }

    /// Persist a new event, then try to create its remote counterpart.
    ///
    /// The local record exists even if the remote call fails; it then stays
    /// `LocalOnly` without a `remote_task_id`.
    pub async fn add_event(&self, user_id: &str, new: NewEvent) -> CoreResult<EventMutation> {
        new.validate()?;
        let mut event = new.into_event(user_id, now_ms());

        let Some(provider) = &self.provider else {
            self.store.insert_event(&event)?;
            tracing::debug!(event_id = %event.id, "Created local-only event");
            return Ok(EventMutation {
                event,
                remote: RemoteOutcome::Skipped,
            });
        };

        let _guard = self.begin(&event.id)?;
        event.sync_state = SyncState::PendingRemoteCreate;
        self.store.insert_event(&event)?;

        let remote = match provider.create_task(&NewRemoteTask::from_event(&event)).await {
            Ok(remote_id) => {
                tracing::debug!(event_id = %event.id, remote_id = %remote_id, "Linked event to remote task");
                event.remote_task_id = Some(remote_id);
                event.sync_state = SyncState::Linked;
                RemoteOutcome::Synced
            }
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "Remote create failed, keeping event local");
                event.sync_state = SyncState::LocalOnly;
                RemoteOutcome::Failed(err)
            }
        };
        event.updated_at = now_ms();
        self.save(&event)?;

        Ok(EventMutation { event, remote })
    }

    /// Flip `completed` locally, then propagate to the remote task if linked.
    ///
    /// A failed propagation keeps the local value; the next reconciliation
    /// pass settles the difference.
    pub async fn toggle_event_complete(&self, user_id: &str, event_id: &str) -> CoreResult<EventMutation> {
        let _guard = self.begin(event_id)?;

        let mut event = self.load(user_id, event_id)?;
        event.completed = !event.completed;
        event.updated_at = now_ms();
        self.save(&event)?;

        let remote = match (&self.provider, &event.remote_task_id) {
            (Some(provider), Some(remote_id)) if event.is_linked() => {
                match provider
                    .update_task(remote_id, &RemoteTaskPatch::completion(event.completed))
                    .await
                {
                    Ok(()) => RemoteOutcome::Synced,
                    Err(err) => {
                        tracing::warn!(
                            event_id,
                            remote_id = %remote_id,
                            error = %err,
                            "Remote completion update failed, will settle on next sync"
                        );
                        RemoteOutcome::Failed(err)
                    }
                }
            }
            _ => RemoteOutcome::Skipped,
        };

        Ok(EventMutation { event, remote })
    }

    /// Delete an event. The local delete always happens; the remote delete
    /// is attempted first for linked events and only logged on failure.
    pub async fn remove_event(&self, user_id: &str, event_id: &str) -> CoreResult<EventMutation> {
        let _guard = self.begin(event_id)?;
        let mut event = self.load(user_id, event_id)?;

        let remote = match (&self.provider, event.remote_task_id.clone()) {
            (Some(provider), Some(remote_id)) if event.is_linked() => {
                event.sync_state = SyncState::PendingRemoteDelete;
                event.updated_at = now_ms();
                self.save(&event)?;

                match provider.delete_task(&remote_id).await {
                    Ok(()) => RemoteOutcome::Synced,
                    Err(err) => {
                        tracing::warn!(
                            event_id,
                            remote_id = %remote_id,
                            error = %err,
                            "Remote delete failed, removing locally anyway"
                        );
                        RemoteOutcome::Failed(err)
                    }
                }
            }
            _ => RemoteOutcome::Skipped,
        };

        if !self.store.delete_event(user_id, event_id)? {
            tracing::debug!(event_id, "Event vanished before local delete");
        }

        Ok(EventMutation { event, remote })
    }

    /// Pull the remote task list and adopt remote completion flags.
    ///
    /// Remote wins for `completed`, except for events mutated locally while
    /// the pass runs: the listing may predate those, so they wait for the
    /// next pass. Linked events missing from a successful listing become
    /// `Orphaned` and stop propagating; an orphan whose task reappears is
    /// linked again. Events left in a pending state by an earlier failure are
    /// settled locally. Never runs concurrently with itself.
    pub async fn reconcile(&self, user_id: &str) -> CoreResult<ReconcileOutcome> {
        let Some(provider) = &self.provider else {
            return Ok(ReconcileOutcome::NoProvider);
        };

        if self
            .reconciling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Reconciliation already running, skipping");
            return Ok(ReconcileOutcome::Skipped);
        }
        let _pass = PassGuard(&self.reconciling);

        // Must happen before the listing is requested
        self.reset_touched();

        let remote_tasks = match provider.list_tasks().await {
            Ok(tasks) => tasks,
            Err(err) => {
                tracing::warn!(error = %err, "Task provider unavailable, retrying next cycle");
                return Ok(ReconcileOutcome::ProviderUnavailable(err));
            }
        };

        let remote: HashMap<&str, bool> = remote_tasks
            .iter()
            .map(|t| (t.id.as_str(), t.completed))
            .collect();

        let mut report = ReconcileReport {
            pulled: remote_tasks.len(),
            ..ReconcileReport::default()
        };

        for snapshot in self.store.list_events(user_id)? {
            let relevant = match snapshot.sync_state {
                SyncState::Linked | SyncState::Orphaned => snapshot.remote_task_id.is_some(),
                SyncState::PendingRemoteCreate | SyncState::PendingRemoteDelete => true,
                SyncState::LocalOnly => false,
            };
            if !relevant {
                continue;
            }

            // Held for the read-modify-write below
            let Ok(_guard) = self.begin(&snapshot.id) else {
                report.deferred += 1;
                continue;
            };
            if self.touched_during_pass(&snapshot.id) {
                report.deferred += 1;
                continue;
            }
            let Some(mut event) = self.store.get_event(user_id, &snapshot.id)? else {
                continue;
            };

            match event.sync_state {
                SyncState::PendingRemoteCreate => {
                    // Create outcome unknown; keep the event usable locally
                    tracing::info!(event_id = %event.id, "Settling interrupted remote create as local-only");
                    event.sync_state = SyncState::LocalOnly;
                    event.updated_at = now_ms();
                    self.store.update_event(&event)?;
                    report.recovered += 1;
                    continue;
                }
                SyncState::PendingRemoteDelete => {
                    tracing::info!(event_id = %event.id, "Finishing interrupted delete");
                    self.store.delete_event(user_id, &event.id)?;
                    report.recovered += 1;
                    continue;
                }
                SyncState::LocalOnly => continue,
                SyncState::Linked | SyncState::Orphaned => {}
            }

            let Some(remote_id) = event.remote_task_id.clone() else {
                continue;
            };

            let changed = match (remote.get(remote_id.as_str()), event.sync_state) {
                (Some(&completed), state) => {
                    let mut changed = false;
                    if state == SyncState::Orphaned {
                        event.sync_state = SyncState::Linked;
                        report.relinked += 1;
                        changed = true;
                    }
                    if event.completed != completed {
                        event.completed = completed;
                        report.updated += 1;
                        changed = true;
                    }
                    changed
                }
                (None, SyncState::Linked) => {
                    tracing::info!(event_id = %event.id, remote_id = %remote_id, "Remote task disappeared, marking event orphaned");
                    event.sync_state = SyncState::Orphaned;
                    report.orphaned += 1;
                    true
                }
                (None, _) => false,
            };

            if changed {
                event.updated_at = now_ms();
                self.store.update_event(&event)?;
            }
        }

        tracing::debug!(
            pulled = report.pulled,
            updated = report.updated,
            orphaned = report.orphaned,
            deferred = report.deferred,
            recovered = report.recovered,
            "Reconciliation finished"
        );
        Ok(ReconcileOutcome::Completed(report))
    }
}
