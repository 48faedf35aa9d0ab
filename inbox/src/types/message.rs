//! Contact message as mirrored from the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned message identifier
pub type MessageId = i64;

/// A contact-form message, as served by `GET /messages/{view}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    /// Client-only marker for permanent removal. Never read from the wire.
    #[serde(skip)]
    pub is_forever_deleted: bool,
}

impl Message {
    /// Create an unread, unarchived message
    pub fn new(
        id: MessageId,
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
            date,
            is_read: false,
            is_archived: false,
            is_deleted: false,
            deleted_date: None,
            is_forever_deleted: false,
        }
    }

    /// Soft-delete or restore, keeping `deleted_date` in step with `is_deleted`.
    ///
    /// The date is only stamped on a real `false -> true` transition, so
    /// deleting an already deleted message keeps its original date.
    pub fn set_deleted(&mut self, deleted: bool, now: DateTime<Utc>) {
        if deleted && !self.is_deleted {
            self.deleted_date = Some(now);
        } else if !deleted {
            self.deleted_date = None;
        }
        self.is_deleted = deleted;
    }

    /// Whether the message is still a live record (not queued for removal)
    pub fn is_live(&self) -> bool {
        !self.is_forever_deleted
    }
}
