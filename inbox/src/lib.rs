//! Admin inbox for portfolio contact messages
//!
//! Keeps a synced snapshot and an optimistic working copy of the messages,
//! filters them into views, pages them, tracks selection, and pushes the
//! minimal set of changes back to the API in debounced batches.
//!
//! ## Module Organization
//!
//! - `types/`: messages, change records, views, events, errors
//! - `sync/`: change tracking, debounce timer, batch dispatcher
//! - `services/`: view filter, pagination, selection, logging
//! - `state/`: the `Inbox` controller and its snapshots
//! - `adapters/`: HTTP and in-memory message backends
//! - `config/`: configuration loading

pub mod adapters;
pub mod config;
pub mod services;
pub mod state;
pub mod sync;
pub mod types;

pub use adapters::{MemoryBackend, MessageBackend};
#[cfg(feature = "http")]
pub use adapters::HttpBackend;
pub use config::InboxConfig;
pub use services::{PageLink, SelectionState};
pub use state::{Inbox, InboxSnapshot};
pub use sync::FlushOutcome;
pub use types::{ChangeRecord, InboxError, InboxEvent, Message, MessageId, Result, View};
