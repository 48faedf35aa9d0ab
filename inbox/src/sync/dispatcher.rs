//! Debounced, single-flight batch sync
//!
//! Local edits schedule a flush after an idle window. A flush takes the
//! pending change records from the store, sends them in one `putMany` call
//! and reports the outcome back to the store. Only one flush is ever in
//! flight; later requests queue on the flight lock and then look at the
//! pending records as they are at that moment.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use crate::adapters::MessageBackend;
use crate::services::logger::fmt_ms;
use crate::types::{ChangeRecord, InboxError, Message, Result};

/// Records taken from the store for one flush, together with the working
/// collection they were computed from
#[derive(Debug, Clone)]
pub struct FlushBatch {
    pub records: Vec<ChangeRecord>,
    pub working: Vec<Message>,
}

/// Owner of the pending changes, seen from the dispatcher
pub trait SyncStore: Send + Sync + 'static {
    /// Snapshot the pending records. `None` when nothing is pending.
    fn begin_flush(&self) -> Option<FlushBatch>;

    /// The batch was persisted
    fn commit_flush(&self, batch: FlushBatch);

    /// The batch was rejected; nothing local may change
    fn abort_flush(&self, batch: &FlushBatch, error: &InboxError);
}

/// Result of a flush attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending, no request was made
    Idle,
    /// This many records were persisted
    Flushed(usize),
}

struct Inner<S> {
    backend: Arc<dyn MessageBackend>,
    store: Arc<S>,
    debouncer: Debouncer,
    flight: tokio::sync::Mutex<()>,
    in_flight: AtomicBool,
}

pub struct SyncDispatcher<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for SyncDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SyncStore> SyncDispatcher<S> {
    pub fn new(backend: Arc<dyn MessageBackend>, store: Arc<S>, idle: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                debouncer: Debouncer::new(idle),
                flight: tokio::sync::Mutex::new(()),
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Restart the idle timer; the flush runs once edits stop for the window.
    /// Returns `false` when no timer could be started.
    pub fn schedule(&self) -> bool {
        let dispatcher = self.clone();
        self.inner.debouncer.arm(move || async move {
            if let Err(e) = dispatcher.flush().await {
                warn!("Debounced flush failed: {}", e);
            }
        })
    }

    /// Cancel the timer and flush right away
    pub async fn flush_now(&self) -> Result<FlushOutcome> {
        self.inner.debouncer.cancel();
        self.flush().await
    }

    /// Cancel a scheduled flush without sending anything
    pub fn cancel(&self) -> bool {
        self.inner.debouncer.cancel()
    }

    /// Whether a debounced flush is waiting to fire
    pub fn is_scheduled(&self) -> bool {
        self.inner.debouncer.is_armed()
    }

    /// Whether a `putMany` call is currently awaiting its response
    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Send every pending record in one batch
    pub async fn flush(&self) -> Result<FlushOutcome> {
        let _flight = self.inner.flight.lock().await;
        self.flush_locked().await
    }

    /// Flush immediately, then run `then` while still holding the flight
    /// lock, so no other flush can interleave with it. `then` is skipped
    /// when the flush fails.
    pub async fn flush_then<T, F, Fut>(&self, then: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.inner.debouncer.cancel();
        let _flight = self.inner.flight.lock().await;
        self.flush_locked().await?;
        then().await
    }

    async fn flush_locked(&self) -> Result<FlushOutcome> {
        let Some(batch) = self.inner.store.begin_flush() else {
            debug!("Flush skipped, no pending changes");
            return Ok(FlushOutcome::Idle);
        };

        let count = batch.records.len();
        info!("Flushing {} change records", count);

        self.inner.in_flight.store(true, Ordering::SeqCst);
        let started = Instant::now();
        let result = self.inner.backend.put_many(&batch.records).await;
        self.inner.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                info!("Flushed {} change records in {}", count, fmt_ms(started.elapsed()));
                self.inner.store.commit_flush(batch);
                Ok(FlushOutcome::Flushed(count))
            }
            Err(e) => {
                warn!(
                    "Flush of {} change records failed after {}: {}",
                    count,
                    fmt_ms(started.elapsed()),
                    e
                );
                self.inner.store.abort_flush(&batch, &e);
                Err(e)
            }
        }
    }
}
