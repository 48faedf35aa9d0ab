//! Per-message change records sent to `PUT /messages/putMany`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::message::{Message, MessageId};

/// Minimal field-level delta for one message.
///
/// Every field except `id` is optional; `None` means "unchanged". For
/// `deleted_date` the inner `Option` is the value itself, so
/// `Some(None)` serializes as `"deletedDate": null` (clear the date).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub deleted_date: Option<Option<DateTime<Utc>>>,
    /// Sentinel: remove the row instead of updating it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_forever_deleted: Option<bool>,
}

/// A present key (even `null`) becomes `Some(..)`; an absent key stays `None`
/// through `#[serde(default)]`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
}

impl ChangeRecord {
    /// Record carrying only an id
    pub fn new(id: MessageId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Record that asks the server to remove the row for `id`
    pub fn forever_delete(id: MessageId) -> Self {
        Self {
            id,
            is_forever_deleted: Some(true),
            ..Default::default()
        }
    }

    /// Whether this record carries the forever-delete sentinel
    pub fn is_forever_delete(&self) -> bool {
        self.is_forever_deleted == Some(true)
    }

    /// A record with nothing but its id is empty and must not be sent
    pub fn is_empty(&self) -> bool {
        self.changed_fields() == 0
    }

    /// Number of fields this record changes (the id is not counted)
    pub fn changed_fields(&self) -> usize {
        [
            self.name.is_some(),
            self.email.is_some(),
            self.subject.is_some(),
            self.message.is_some(),
            self.date.is_some(),
            self.is_read.is_some(),
            self.is_archived.is_some(),
            self.is_deleted.is_some(),
            self.deleted_date.is_some(),
            self.is_forever_deleted.is_some(),
        ]
        .iter()
        .filter(|changed| **changed)
        .count()
    }

    /// Merge the listed fields into a stored message.
    ///
    /// `deleted_date` follows `is_deleted` using `now`, the way the
    /// backend stamps it; a client-sent date is ignored in that case.
    pub fn apply_to(&self, target: &mut Message, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            target.name = name.clone();
        }
        if let Some(email) = &self.email {
            target.email = email.clone();
        }
        if let Some(subject) = &self.subject {
            target.subject = subject.clone();
        }
        if let Some(message) = &self.message {
            target.message = message.clone();
        }
        if let Some(date) = self.date {
            target.date = date;
        }
        if let Some(is_read) = self.is_read {
            target.is_read = is_read;
        }
        if let Some(is_archived) = self.is_archived {
            target.is_archived = is_archived;
        }
        match self.is_deleted {
            Some(true) => {
                target.is_deleted = true;
                target.deleted_date = Some(now);
            }
            Some(false) => {
                target.is_deleted = false;
                target.deleted_date = None;
            }
            None => {
                if let Some(deleted_date) = self.deleted_date {
                    target.deleted_date = deleted_date;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serializes_only_changed_fields() {
        let record = ChangeRecord {
            id: 7,
            is_archived: Some(true),
            is_read: Some(true),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 7, "isRead": true, "isArchived": true })
        );
    }

    #[test]
    fn test_cleared_deleted_date_serializes_as_null() {
        let record = ChangeRecord {
            id: 2,
            is_deleted: Some(false),
            deleted_date: Some(None),
            ..Default::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"deletedDate\":null"));

        let back: ChangeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.deleted_date, Some(None));

        let absent: ChangeRecord = serde_json::from_str(r#"{"id":2}"#).unwrap();
        assert_eq!(absent.deleted_date, None);
        assert!(absent.is_empty());
    }

    #[test]
    fn test_forever_delete_sentinel() {
        let record = ChangeRecord::forever_delete(9);
        assert!(record.is_forever_delete());
        assert_eq!(record.changed_fields(), 1);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({ "id": 9, "isForeverDeleted": true })
        );
    }

    #[test]
    fn test_apply_stamps_deleted_date() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut msg = Message::new(1, "a", "a@b.c", "s", "m", created);

        let delete = ChangeRecord {
            id: 1,
            is_deleted: Some(true),
            ..Default::default()
        };
        delete.apply_to(&mut msg, now);
        assert!(msg.is_deleted);
        assert_eq!(msg.deleted_date, Some(now));

        let restore = ChangeRecord {
            id: 1,
            is_deleted: Some(false),
            ..Default::default()
        };
        restore.apply_to(&mut msg, now);
        assert!(!msg.is_deleted);
        assert!(msg.deleted_date.is_none());
    }
}
