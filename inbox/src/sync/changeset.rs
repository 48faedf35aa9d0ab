//! Change tracking between the synced snapshot and the working copy.
//!
//! Records are always recomputed from the synced snapshot, never merged
//! incrementally, so a pending record is the true cumulative delta for its
//! message. A forever-delete wins over every other change and travels alone.

use std::collections::BTreeMap;

use crate::types::{ChangeRecord, Message, MessageId};

/// Compute the minimal record turning `synced` into `working`.
///
/// With no synced counterpart every mutable field is emitted.
pub fn diff(synced: Option<&Message>, working: &Message) -> ChangeRecord {
    if working.is_forever_deleted {
        return ChangeRecord::forever_delete(working.id);
    }

    let mut record = ChangeRecord::new(working.id);

    let Some(synced) = synced else {
        record.is_read = Some(working.is_read);
        record.is_archived = Some(working.is_archived);
        record.is_deleted = Some(working.is_deleted);
        record.deleted_date = Some(working.deleted_date);
        return record;
    };

    if synced.name != working.name {
        record.name = Some(working.name.clone());
    }
    if synced.email != working.email {
        record.email = Some(working.email.clone());
    }
    if synced.subject != working.subject {
        record.subject = Some(working.subject.clone());
    }
    if synced.message != working.message {
        record.message = Some(working.message.clone());
    }
    if synced.date != working.date {
        record.date = Some(working.date);
    }
    if synced.is_read != working.is_read {
        record.is_read = Some(working.is_read);
    }
    if synced.is_archived != working.is_archived {
        record.is_archived = Some(working.is_archived);
    }
    if synced.is_deleted != working.is_deleted {
        record.is_deleted = Some(working.is_deleted);
    }
    if synced.deleted_date != working.deleted_date {
        record.deleted_date = Some(working.deleted_date);
    }

    record
}

/// Pending change records keyed by message id
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pending: BTreeMap<MessageId, ChangeRecord>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute and replace the pending record for `working.id`.
    ///
    /// Returns the record now pending, or `None` when the working copy
    /// matches the snapshot again.
    pub fn track(&mut self, synced: Option<&Message>, working: &Message) -> Option<&ChangeRecord> {
        let record = diff(synced, working);
        if record.is_empty() {
            self.pending.remove(&working.id);
            return None;
        }
        self.pending.insert(working.id, record);
        self.pending.get(&working.id)
    }

    /// Rebuild the whole set from two collections
    pub fn rebuild(synced: &[Message], working: &[Message]) -> Self {
        let by_id: BTreeMap<MessageId, &Message> = synced.iter().map(|m| (m.id, m)).collect();
        let mut set = Self::new();
        for message in working {
            set.track(by_id.get(&message.id).copied(), message);
        }
        set
    }

    /// Pending records in id order, ready for `putMany`
    pub fn records(&self) -> Vec<ChangeRecord> {
        self.pending.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
