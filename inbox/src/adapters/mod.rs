//! Backends for the message API
//!
//! - `http`: the real REST API (`GET /messages/{view}`, `PUT /messages/putMany`)
//! - `memory`: in-process store with the same contract, including the
//!   server-side `putMany` rules and the retention job

use async_trait::async_trait;

use crate::types::{ChangeRecord, Message, Result, View};

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Message API consumed by the inbox
#[async_trait]
pub trait MessageBackend: Send + Sync {
    /// All messages in `view`, newest first
    async fn fetch(&self, view: View) -> Result<Vec<Message>>;

    /// Apply a batch of change records. The batch either succeeds or fails
    /// as a whole.
    async fn put_many(&self, records: &[ChangeRecord]) -> Result<()>;
}
