pub mod change;
pub mod error;
pub mod message;
pub mod view;

use serde::{Deserialize, Serialize};

pub use change::ChangeRecord;
pub use error::{InboxError, Result};
pub use message::{Message, MessageId};
pub use view::View;

/// Notifications published by the inbox for the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboxEvent {
    /// A view finished loading from the server
    Loaded { view: View, count: usize },
    /// Loading a view failed; the view is shown empty until a refresh
    FetchFailed { view: View, error: String },
    /// The active view changed
    ViewChanged { view: View },
    /// The visible page was recomputed
    PageChanged { page: usize, ids: Vec<MessageId> },
    /// The renderer should scroll to `offset` before the page swaps
    ScrollRequested { offset: u32 },
    /// A batch of change records was persisted
    FlushSucceeded { count: usize },
    /// A batch update was rejected; local edits are kept for the next attempt
    FlushFailed { error: String },
    /// Edits arrived while a view was loading; they are applied once it lands
    EditsDeferred { count: usize },
    /// Edits are pending but no flush could be scheduled (no async runtime)
    FlushNotScheduled { pending: usize },
}
