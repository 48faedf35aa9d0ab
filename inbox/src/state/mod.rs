//! Inbox state management

pub mod inbox;

use serde::Serialize;

use crate::services::{PageLink, SelectionState};
use crate::types::{Message, MessageId, View};

pub use inbox::{Inbox, InboxState};

/// Everything a renderer needs to draw the inbox
#[derive(Debug, Clone, Serialize)]
pub struct InboxSnapshot {
    pub view: View,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub page_links: Vec<PageLink>,
    /// Messages on the current page, in display order
    pub items: Vec<Message>,
    /// Messages in the view across all pages
    pub visible_count: usize,
    pub unread_count: usize,
    pub selection_state: SelectionState,
    pub selected_on_page: Vec<MessageId>,
    pub selected_ids: Vec<MessageId>,
    pub pending_changes: usize,
    pub loading: bool,
    pub load_error: Option<String>,
    pub flush_in_flight: bool,
    pub flush_scheduled: bool,
}

impl InboxSnapshot {
    pub fn item_ids(&self) -> Vec<MessageId> {
        self.items.iter().map(|m| m.id).collect()
    }
}
