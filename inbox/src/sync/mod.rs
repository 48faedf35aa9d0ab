//! Sync engine for optimistic inbox edits
//!
//! - `changeset`: minimal per-message deltas against the synced snapshot
//! - `debounce`: cancelable idle timer
//! - `dispatcher`: debounced, single-flight `putMany` batches

pub mod changeset;
pub mod debounce;
pub mod dispatcher;

pub use changeset::{diff, ChangeSet};
pub use debounce::Debouncer;
pub use dispatcher::{FlushBatch, FlushOutcome, SyncDispatcher, SyncStore};
