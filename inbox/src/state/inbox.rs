//! Inbox controller
//!
//! Owns the synced snapshot, the working copy, the pending change set, the
//! selection and the page cursor. Renderers read `InboxSnapshot`s and call
//! the intent methods; nothing else writes the state.
//!
//! Edits are applied to the working copy immediately and flushed by the
//! dispatcher after the idle window. Refreshing or switching view flushes
//! first and fetches afterwards under the same flight lock; edits are
//! refused while that is running.

use chrono::{DateTime, Utc};
use flume::{Receiver, Sender};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use super::InboxSnapshot;
use crate::adapters::MessageBackend;
use crate::config::InboxConfig;
use crate::services::filter::{filter_view, unread_count};
use crate::services::pagination::Paginator;
use crate::services::selection::Selection;
use crate::sync::{ChangeSet, FlushBatch, FlushOutcome, SyncDispatcher, SyncStore};
use crate::types::{InboxError, InboxEvent, Message, MessageId, Result, View};

/// A flag change requested by the admin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Read(bool),
    Archived(bool),
    Deleted(bool),
    DeleteForever,
}

impl Edit {
    fn apply(self, message: &mut Message, now: DateTime<Utc>) {
        match self {
            Self::Read(read) => message.is_read = read,
            Self::Archived(archived) => message.is_archived = archived,
            Self::Deleted(deleted) => message.set_deleted(deleted, now),
            Self::DeleteForever => message.is_forever_deleted = true,
        }
    }
}

/// Mutable inbox state, only reachable through `Inbox`
#[derive(Debug)]
pub struct InboxState {
    view: View,
    synced: Vec<Message>,
    working: Vec<Message>,
    changes: ChangeSet,
    selection: Selection,
    paginator: Paginator,
    loading: bool,
    load_error: Option<String>,
    last_page: Option<(usize, Vec<MessageId>)>,
    /// Bumped whenever the collection is replaced by a fetch
    generation: u64,
    /// Latest page request still waiting for its transition, as
    /// `(request number, target page)`
    pending_page: Option<(u64, usize)>,
    page_requests: u64,
    /// Edits received while loading, replayed once the load finishes
    deferred: Vec<(Vec<MessageId>, Edit)>,
}

impl InboxState {
    fn new(page_size: usize) -> Self {
        Self {
            view: View::default(),
            synced: Vec::new(),
            working: Vec::new(),
            changes: ChangeSet::new(),
            selection: Selection::new(),
            paginator: Paginator::new(page_size),
            loading: false,
            load_error: None,
            last_page: None,
            generation: 0,
            pending_page: None,
            page_requests: 0,
            deferred: Vec::new(),
        }
    }

    fn visible(&self) -> Vec<&Message> {
        filter_view(&self.working, self.view)
    }

    fn page_messages(&self) -> Vec<&Message> {
        let visible = self.visible();
        let range = self.paginator.range(visible.len());
        visible[range].to_vec()
    }

    fn page_ids(&self) -> Vec<MessageId> {
        self.page_messages().iter().map(|m| m.id).collect()
    }

    fn prune_selection(&mut self) {
        let live: Vec<MessageId> = self
            .working
            .iter()
            .filter(|m| m.is_live())
            .map(|m| m.id)
            .collect();
        let dropped = self.selection.prune(live);
        if dropped > 0 {
            debug!("Pruned {} stale ids from selection", dropped);
        }
    }

    /// Re-clamp the cursor and announce the page if its number or
    /// contents changed since the last announcement
    fn publish_page(&mut self, events: &Sender<InboxEvent>) {
        let len = self.visible().len();
        let page = self.paginator.clamp(len);
        let ids = self.page_ids();

        let unchanged = self
            .last_page
            .as_ref()
            .is_some_and(|(last, last_ids)| *last == page && *last_ids == ids);
        if unchanged {
            return;
        }

        let _ = events.send(InboxEvent::PageChanged {
            page,
            ids: ids.clone(),
        });
        self.last_page = Some((page, ids));
    }

    /// Replace both copies with freshly fetched messages
    fn replace_collection(&mut self, view: View, messages: Vec<Message>) {
        if view != self.view {
            self.paginator.reset();
        }
        self.view = view;
        self.generation += 1;
        self.pending_page = None;
        self.synced = messages.clone();
        self.working = messages;
        self.changes.clear();
        self.load_error = None;
        self.prune_selection();
    }

    fn snapshot(&self) -> InboxSnapshot {
        let visible_count = self.visible().len();
        let items: Vec<Message> = self.page_messages().into_iter().cloned().collect();
        let page_ids: Vec<MessageId> = items.iter().map(|m| m.id).collect();

        InboxSnapshot {
            view: self.view,
            page: self.paginator.current(),
            page_size: self.paginator.page_size(),
            total_pages: self.paginator.total_pages(visible_count),
            page_links: self.paginator.links(visible_count),
            visible_count,
            unread_count: unread_count(&self.working, self.view),
            selection_state: self.selection.page_state(&page_ids),
            selected_on_page: self.selection.selected_on_page(&page_ids),
            selected_ids: self.selection.ids(),
            items,
            pending_changes: self.changes.len(),
            loading: self.loading,
            load_error: self.load_error.clone(),
            flush_in_flight: false,
            flush_scheduled: false,
        }
    }
}

/// State and event channel shared between the controller and the dispatcher
struct Shared {
    state: Mutex<InboxState>,
    events: Sender<InboxEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: InboxEvent) {
        let _ = self.events.send(event);
    }
}

impl SyncStore for Shared {
    fn begin_flush(&self) -> Option<FlushBatch> {
        let state = self.lock();
        if state.changes.is_empty() {
            return None;
        }
        Some(FlushBatch {
            records: state.changes.records(),
            working: state.working.clone(),
        })
    }

    fn commit_flush(&self, batch: FlushBatch) {
        let removed: HashSet<MessageId> = batch
            .records
            .iter()
            .filter(|r| r.is_forever_delete())
            .map(|r| r.id)
            .collect();
        let count = batch.records.len();

        let mut guard = self.lock();
        let state = &mut *guard;
        // The server restamps deletedDate on its own clock. The synced copy
        // keeps the client stamp sent in the batch until the next fetch, which
        // replaces both copies at once, so no spurious record appears.
        state.synced = batch
            .working
            .into_iter()
            .filter(|m| !removed.contains(&m.id))
            .collect();
        state.working.retain(|m| !removed.contains(&m.id));
        // edits made while the batch was in flight stay pending
        state.changes = ChangeSet::rebuild(&state.synced, &state.working);
        state.prune_selection();
        state.publish_page(&self.events);
        drop(guard);

        self.emit(InboxEvent::FlushSucceeded { count });
    }

    fn abort_flush(&self, batch: &FlushBatch, error: &InboxError) {
        error!(
            "Keeping {} unsynced change records after failed flush: {}",
            batch.records.len(),
            error
        );
        self.emit(InboxEvent::FlushFailed {
            error: error.to_string(),
        });
    }
}

/// Handle to the inbox. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct Inbox {
    shared: Arc<Shared>,
    backend: Arc<dyn MessageBackend>,
    dispatcher: SyncDispatcher<Shared>,
    config: InboxConfig,
}

impl Inbox {
    /// Create an empty inbox on the regular view. Call `load` to fetch it.
    pub fn new(
        backend: Arc<dyn MessageBackend>,
        config: InboxConfig,
    ) -> (Self, Receiver<InboxEvent>) {
        let (tx, rx) = flume::unbounded();
        let shared = Arc::new(Shared {
            state: Mutex::new(InboxState::new(config.page_size)),
            events: tx,
        });
        let dispatcher = SyncDispatcher::new(backend.clone(), shared.clone(), config.debounce());

        let inbox = Self {
            shared,
            backend,
            dispatcher,
            config,
        };
        (inbox, rx)
    }

    pub fn config(&self) -> &InboxConfig {
        &self.config
    }

    /// Read-only view of the current state
    pub fn snapshot(&self) -> InboxSnapshot {
        let mut snapshot = self.shared.lock().snapshot();
        snapshot.flush_in_flight = self.dispatcher.is_in_flight();
        snapshot.flush_scheduled = self.dispatcher.is_scheduled();
        snapshot
    }

    pub fn view(&self) -> View {
        self.shared.lock().view
    }

    // ====================================================================
    // Loading
    // ====================================================================

    /// Initial fetch of the current view
    pub async fn load(&self) -> Result<usize> {
        let view = self.view();
        self.reload(view).await
    }

    /// Flush pending edits, then re-fetch the current view
    pub async fn refresh(&self) -> Result<usize> {
        let view = self.view();
        info!("Refreshing {} view", view);
        self.reload(view).await
    }

    /// Flush the current view's edits, then load `view`.
    ///
    /// When the flush fails the switch is abandoned and the current view
    /// keeps its unsynced edits.
    pub async fn switch_view(&self, view: View) -> Result<usize> {
        let from = self.view();
        if from != view {
            info!("Switching inbox view {} -> {}", from, view);
        }
        self.reload(view).await
    }

    async fn reload(&self, view: View) -> Result<usize> {
        {
            let mut state = self.shared.lock();
            if state.loading {
                return Err(InboxError::InvalidInput("inbox is already loading".into()));
            }
            state.loading = true;
        }

        let result = self
            .dispatcher
            .flush_then(|| self.fetch_into(view))
            .await;

        let deferred = {
            let mut state = self.shared.lock();
            state.loading = false;
            std::mem::take(&mut state.deferred)
        };
        if let Err(e) = &result {
            warn!("Loading {} view failed: {}", view, e);
        }

        for (ids, edit) in deferred {
            let applied = self.edit(&ids, edit);
            if applied < ids.len() {
                warn!(
                    "{} of {} deferred edits had no effect on the {} view",
                    ids.len() - applied,
                    ids.len(),
                    view
                );
            }
        }
        result
    }

    /// Runs under the flight lock, after a successful flush
    async fn fetch_into(&self, view: View) -> Result<usize> {
        let fetched = self.backend.fetch(view).await;

        let mut guard = self.shared.lock();
        let state = &mut *guard;
        let view_changed = state.view != view;

        let result = match fetched {
            Ok(messages) => {
                let count = messages.len();
                state.replace_collection(view, messages);
                info!("Loaded {} {} messages", count, view);
                Ok(count)
            }
            Err(e) => {
                // nothing is pending here: the flush just succeeded
                state.replace_collection(view, Vec::new());
                state.load_error = Some(e.to_string());
                Err(e)
            }
        };

        if view_changed {
            self.shared.emit(InboxEvent::ViewChanged { view });
        }
        match &result {
            Ok(count) => self.shared.emit(InboxEvent::Loaded { view, count: *count }),
            Err(e) => self.shared.emit(InboxEvent::FetchFailed {
                view,
                error: e.to_string(),
            }),
        }
        state.publish_page(&self.shared.events);
        result
    }

    // ====================================================================
    // Sync
    // ====================================================================

    /// Flush pending edits now instead of waiting for the idle window
    pub async fn flush_now(&self) -> Result<FlushOutcome> {
        self.dispatcher.flush_now().await
    }

    /// Final flush when the inbox goes away
    pub async fn close(&self) -> Result<FlushOutcome> {
        debug!("Closing inbox");
        self.dispatcher.flush_now().await
    }

    // ====================================================================
    // Edits
    // ====================================================================

    /// Apply `edit` to each live message in `ids`, re-diff it, and schedule
    /// a flush. Unknown ids are skipped. Returns how many messages changed.
    ///
    /// While a view is loading the edit is queued instead, reported with
    /// `EditsDeferred`, and replayed on the fetched collection.
    fn edit(&self, ids: &[MessageId], edit: Edit) -> usize {
        let now = Utc::now();
        let (touched, pending) = {
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            if state.loading {
                debug!("Deferring {:?} on {} messages until loading ends", edit, ids.len());
                state.deferred.push((ids.to_vec(), edit));
                self.shared.emit(InboxEvent::EditsDeferred { count: ids.len() });
                return 0;
            }

            let mut touched = 0;
            for id in ids {
                let Some(working) = state.working.iter_mut().find(|m| m.id == *id && m.is_live()) else {
                    debug!("Ignoring edit of unknown message {}", id);
                    continue;
                };
                let before = working.clone();
                edit.apply(working, now);
                if *working == before {
                    continue;
                }
                let synced = state.synced.iter().find(|m| m.id == *id);
                state.changes.track(synced, working);
                touched += 1;
            }

            if touched > 0 {
                state.prune_selection();
                state.publish_page(&self.shared.events);
            }
            (touched, state.changes.len())
        };

        if touched > 0 && !self.dispatcher.schedule() {
            warn!("{} change records pending with no flush scheduled", pending);
            self.shared.emit(InboxEvent::FlushNotScheduled { pending });
        }
        touched
    }

    /// Open a message for reading; marks it read
    pub fn open(&self, id: MessageId) -> Option<Message> {
        self.set_read(&[id], true);
        self.shared
            .lock()
            .working
            .iter()
            .find(|m| m.id == id && m.is_live())
            .cloned()
    }

    pub fn set_read(&self, ids: &[MessageId], read: bool) -> usize {
        self.edit(ids, Edit::Read(read))
    }

    pub fn set_archived(&self, ids: &[MessageId], archived: bool) -> usize {
        self.edit(ids, Edit::Archived(archived))
    }

    /// Soft-delete (`true`) or restore (`false`)
    pub fn set_deleted(&self, ids: &[MessageId], deleted: bool) -> usize {
        self.edit(ids, Edit::Deleted(deleted))
    }

    /// Queue permanent removal. The messages leave every view at once and
    /// are dropped from the collection after the next successful flush.
    pub fn delete_forever(&self, ids: &[MessageId]) -> usize {
        self.edit(ids, Edit::DeleteForever)
    }

    // ====================================================================
    // Selection
    // ====================================================================

    /// Toggle one id; returns whether it is now selected
    pub fn toggle_selected(&self, id: MessageId) -> bool {
        let mut state = self.shared.lock();
        let known = state.working.iter().any(|m| m.id == id && m.is_live());
        if !known {
            return false;
        }
        state.selection.toggle(id)
    }

    /// "Select all" checkbox of the current page
    pub fn toggle_select_page(&self) {
        let mut state = self.shared.lock();
        let page_ids = state.page_ids();
        state.selection.toggle_page(&page_ids);
    }

    /// Selected ids on the current page; bulk actions act on these
    pub fn selected_on_page(&self) -> Vec<MessageId> {
        let state = self.shared.lock();
        state.selection.selected_on_page(&state.page_ids())
    }

    pub fn selected_ids(&self) -> Vec<MessageId> {
        self.shared.lock().selection.ids()
    }

    pub fn clear_selection(&self) {
        self.shared.lock().selection.clear();
    }

    pub fn mark_selected_read(&self, read: bool) -> usize {
        self.set_read(&self.selected_on_page(), read)
    }

    pub fn archive_selected(&self, archived: bool) -> usize {
        self.set_archived(&self.selected_on_page(), archived)
    }

    pub fn delete_selected(&self) -> usize {
        self.set_deleted(&self.selected_on_page(), true)
    }

    pub fn restore_selected(&self) -> usize {
        self.set_deleted(&self.selected_on_page(), false)
    }

    pub fn delete_selected_forever(&self) -> usize {
        self.delete_forever(&self.selected_on_page())
    }

    // ====================================================================
    // Pagination
    // ====================================================================

    /// Ask the renderer to scroll up, wait for the transition delay, then
    /// switch page. Returns the page shown afterwards.
    ///
    /// The request is dropped if the collection was reloaded during the
    /// delay, since it was made against a list that is no longer shown.
    pub async fn go_to_page(&self, page: usize) -> usize {
        let (view, generation, request) = {
            let mut state = self.shared.lock();
            let total = state.paginator.total_pages(state.visible().len());
            state.page_requests += 1;
            let request = state.page_requests;
            state.pending_page = Some((request, page.clamp(1, total)));
            (state.view, state.generation, request)
        };
        self.shared.emit(InboxEvent::ScrollRequested {
            offset: self.config.scroll_top_offset,
        });
        tokio::time::sleep(self.config.page_transition()).await;

        let mut guard = self.shared.lock();
        let state = &mut *guard;
        if state.view != view || state.generation != generation {
            debug!("Dropping request for page {}, {} view was reloaded", page, view);
            return state.paginator.current();
        }

        if state.pending_page.is_some_and(|(latest, _)| latest == request) {
            state.pending_page = None;
        }
        let len = state.visible().len();
        let shown = state.paginator.go_to(page, len);
        state.publish_page(&self.shared.events);
        shown
    }

    /// Step from the latest requested page, so quick repeated clicks add up
    fn page_step(&self, forward: bool) -> usize {
        let state = self.shared.lock();
        let from = state
            .pending_page
            .map_or_else(|| state.paginator.current(), |(_, page)| page);
        if forward {
            from + 1
        } else {
            from.saturating_sub(1)
        }
    }

    pub async fn next_page(&self) -> usize {
        let page = self.page_step(true);
        self.go_to_page(page).await
    }

    pub async fn previous_page(&self) -> usize {
        let page = self.page_step(false);
        self.go_to_page(page).await
    }
}
