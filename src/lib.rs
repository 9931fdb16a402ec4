//! studyhub - study companion core
//!
//! The deterministic parts of a student productivity app:
//!
//! 1. **Progression**: XP levels from a fixed threshold table, achievement
//!    conditions, and idempotent unlocks with atomic XP awards.
//!
//! 2. **Event sync**: calendar events stored locally first and mirrored on a
//!    best-effort basis into a remote task provider, with periodic
//!    pull-based reconciliation.
//!
//! UI, auth and the hosted backend are out of scope; [`hub::StudyHub`] is
//! the surface a UI (or the bundled CLI) talks to.

pub mod config;
pub mod error;
pub mod events;
pub mod hub;
pub mod progression;
pub mod store;
pub mod sync;

pub use error::{CoreError, CoreResult, PersistenceError};
pub use hub::StudyHub;
