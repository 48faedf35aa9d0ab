//! In-process message store implementing the backend contract.
//!
//! Used for tests and offline demos. Applies `putMany` all-or-nothing,
//! stamps `deletedDate` with server time, removes rows on the forever-delete
//! sentinel and runs the 30-day retention purge on demand.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use super::MessageBackend;
use crate::types::{ChangeRecord, InboxError, Message, MessageId, Result, View};

/// Days a soft-deleted message is kept before the retention job removes it
pub const RETENTION_DAYS: i64 = 30;

#[derive(Default)]
struct Store {
    messages: BTreeMap<MessageId, Message>,
    next_id: MessageId,
}

#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    batches: Mutex<Vec<Vec<ChangeRecord>>>,
    latency: Mutex<Duration>,
    fail_put: AtomicBool,
    fail_fetch: AtomicBool,
    fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a message as-is (keeps its id)
    pub fn insert(&self, mut message: Message) {
        message.is_forever_deleted = false;
        let mut store = self.store();
        store.next_id = store.next_id.max(message.id);
        store.messages.insert(message.id, message);
    }

    /// Store a new contact submission with a fresh id and the current time
    pub fn submit(&self, name: &str, email: &str, subject: &str, body: &str) -> Message {
        let mut store = self.store();
        store.next_id += 1;
        let message = Message::new(store.next_id, name, email, subject, body, Utc::now());
        store.messages.insert(message.id, message.clone());
        message
    }

    pub fn get(&self, id: MessageId) -> Option<Message> {
        self.store().messages.get(&id).cloned()
    }

    /// Every stored message in id order
    pub fn messages(&self) -> Vec<Message> {
        self.store().messages.values().cloned().collect()
    }

    /// Drop a row behind the inbox's back (another session, retention job)
    pub fn remove(&self, id: MessageId) -> Option<Message> {
        self.store().messages.remove(&id)
    }

    /// Remove soft-deleted messages whose `deletedDate` is older than
    /// `retention` at `now`; returns the removed ids
    pub fn purge_expired(&self, now: DateTime<Utc>, retention: ChronoDuration) -> Vec<MessageId> {
        let cutoff = now - retention;
        let mut store = self.store();
        let expired: Vec<MessageId> = store
            .messages
            .values()
            .filter(|m| m.is_deleted && m.deleted_date.is_some_and(|d| d < cutoff))
            .map(|m| m.id)
            .collect();
        for id in &expired {
            store.messages.remove(id);
        }
        if !expired.is_empty() {
            info!("Retention purge removed {} messages", expired.len());
        }
        expired
    }

    /// `purge_expired` with the standard 30-day retention
    pub fn purge_retention(&self, now: DateTime<Utc>) -> Vec<MessageId> {
        self.purge_expired(now, ChronoDuration::days(RETENTION_DAYS))
    }

    /// Make every following `putMany` fail without touching the store
    pub fn set_failing(&self, failing: bool) {
        self.fail_put.store(failing, Ordering::SeqCst);
    }

    /// Make every following fetch fail
    pub fn set_fetch_failing(&self, failing: bool) {
        self.fail_fetch.store(failing, Ordering::SeqCst);
    }

    /// Artificial delay applied to every request
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|p| p.into_inner()) = latency;
    }

    /// Batches received by `putMany`, failed ones included
    pub fn batches(&self) -> Vec<Vec<ChangeRecord>> {
        self.batches.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn put_many_calls(&self) -> usize {
        self.batches.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `putMany` calls observed
    pub fn max_concurrent_put_many(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap_or_else(|p| p.into_inner());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn apply(&self, records: &[ChangeRecord], now: DateTime<Utc>) {
        let mut store = self.store();
        for record in records {
            if record.is_forever_delete() {
                store.messages.remove(&record.id);
                continue;
            }
            match store.messages.get_mut(&record.id) {
                Some(message) => record.apply_to(message, now),
                None => debug!("putMany: message {} no longer exists", record.id),
            }
        }
    }
}

#[async_trait]
impl MessageBackend for MemoryBackend {
    async fn fetch(&self, view: View) -> Result<Vec<Message>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(InboxError::Network("fetch rejected".into()));
        }

        let mut messages: Vec<Message> = self
            .store()
            .messages
            .values()
            .filter(|m| view.matches(m))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn put_many(&self, records: &[ChangeRecord]) -> Result<()> {
        self.batches
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(records.to_vec());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.simulate_latency().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_put.load(Ordering::SeqCst) {
            return Err(InboxError::Status {
                status: 500,
                body: "putMany rejected".into(),
            });
        }

        self.apply(records, Utc::now());
        Ok(())
    }
}
