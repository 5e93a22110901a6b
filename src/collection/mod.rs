//! Collection state machine.
//!
//! One [`CollectionController`] drives one collection: it owns the paginated
//! cursor, the search state, pending drafts, and the debounce timer, and it
//! decides which rows are visible. The same engine is instantiated once per
//! collection; only the gateway differs.
//!
//! All gateway calls happen without holding the state lock. Results are
//! applied afterwards only if they still belong to the current state: page
//! fetches carry a generation number and searches carry their term.

pub mod state;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{FailureKind, Result};
use crate::events::{ControllerEvent, EventBus};
use crate::gateway::CollectionGateway;
use crate::sort::sort_in_place;
use crate::types::{CollectionKind, DraftEdit, ParentId, Row, RowId, SortDirection, SortSpec};
use crate::view::CollectionView;

pub use state::{CollectionState, DraftEdits, PaginationState, Phase, SearchState};

/// Static per-collection settings
#[derive(Debug, Clone)]
pub struct CollectionSettings {
    pub label: String,
    pub page_size: usize,
    pub search_debounce: Duration,
    pub link_prefix: String,
}

impl CollectionSettings {
    pub fn from_config(config: &Config, kind: CollectionKind) -> Self {
        Self {
            label: config.collection(kind).label.clone(),
            page_size: config.page_size,
            search_debounce: config.search_debounce(),
            link_prefix: config.link_prefix.clone(),
        }
    }
}

/// Controller for one collection. Cheap to clone; clones share state.
pub struct CollectionController<G: CollectionGateway + ?Sized> {
    kind: CollectionKind,
    parent: ParentId,
    gateway: Arc<G>,
    settings: Arc<CollectionSettings>,
    state: Arc<Mutex<CollectionState>>,
    debouncer: Arc<Debouncer>,
    events: EventBus,
}

impl<G: CollectionGateway + ?Sized> Clone for CollectionController<G> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            parent: self.parent.clone(),
            gateway: Arc::clone(&self.gateway),
            settings: Arc::clone(&self.settings),
            state: Arc::clone(&self.state),
            debouncer: Arc::clone(&self.debouncer),
            events: self.events.clone(),
        }
    }
}

impl<G: CollectionGateway + ?Sized + 'static> CollectionController<G> {
    pub fn new(
        kind: CollectionKind,
        parent: ParentId,
        gateway: Arc<G>,
        settings: CollectionSettings,
        events: EventBus,
    ) -> Self {
        let state = CollectionState::new(settings.page_size);
        let debouncer = Debouncer::new(settings.search_debounce);
        Self {
            kind,
            parent,
            gateway,
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(state)),
            debouncer: Arc::new(debouncer),
            events,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn parent(&self) -> &ParentId {
        &self.parent
    }

    pub(crate) fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Copy of the full internal state
    pub fn snapshot(&self) -> CollectionState {
        self.state.lock().clone()
    }

    /// Read-only projection for the presentation layer
    pub fn view(&self) -> CollectionView {
        let state = self.state.lock();
        CollectionView::from_state(self.kind, &self.settings.label, &state)
    }

    /// Rows currently displayed: search results in search mode, otherwise
    /// the paginated window.
    pub fn active_rows(&self) -> Vec<Row> {
        self.state.lock().active_rows().to_vec()
    }

    pub fn is_search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Attach the navigation link to rows coming from the gateway.
    fn receive(&self, mut rows: Vec<Row>) -> Vec<Row> {
        for row in rows.iter_mut() {
            row.link = Some(format!("{}{}", self.settings.link_prefix, row.id));
        }
        rows
    }

    fn emit(&self, event: ControllerEvent) -> ControllerEvent {
        self.events.emit(event.clone());
        event
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// Mark the window as being replaced by a first-page fetch.
    pub(crate) fn begin_initial(&self) -> u64 {
        self.state.lock().pagination.begin_fetch(true)
    }

    /// First page and exact count, fetched concurrently. Both calls run to
    /// completion even if one of them fails.
    pub(crate) async fn fetch_initial(&self) -> Result<(Vec<Row>, usize)> {
        let page_size = self.settings.page_size;
        let (rows, total) = futures::join!(
            self.gateway.fetch_page(&self.parent, page_size, 0),
            self.gateway.fetch_count(&self.parent)
        );
        Ok((rows?, total?))
    }

    /// Apply a first page. Returns `None` when the fetch went stale.
    pub(crate) fn apply_initial(
        &self,
        generation: u64,
        rows: Vec<Row>,
        total: usize,
    ) -> Option<ControllerEvent> {
        let rows = self.receive(rows);
        let mut state = self.state.lock();
        if !state.accepts_page(generation) {
            tracing::debug!(collection = %self.kind, "discarding stale initial load");
            return None;
        }

        let page_size = state.pagination.page_size;
        state.pagination.replace(rows, page_size);
        state.total_count = total;
        state.sort = None;
        state.error = None;
        let event = ControllerEvent::Loaded {
            collection: self.kind,
            rows: state.pagination.rows.len(),
            total,
        };
        drop(state);

        Some(self.emit(event))
    }

    /// Record a failed load for the fetch started under `generation`.
    /// Returns false when that fetch is already stale.
    pub(crate) fn fail_load(&self, generation: u64, failure: FailureKind) -> bool {
        let mut state = self.state.lock();
        if !state.accepts_page(generation) {
            return false;
        }
        state.pagination.fail();
        state.error = Some(failure);
        true
    }

    pub(crate) fn record_failure(&self, failure: FailureKind) {
        self.state.lock().error = Some(failure);
    }

    /// Load the first page and the total count of this collection alone.
    /// Returns `None` if the collection was reset while the fetch ran.
    pub async fn initial_load(&self) -> Option<ControllerEvent> {
        let generation = self.begin_initial();
        match self.fetch_initial().await {
            Ok((rows, total)) => self.apply_initial(generation, rows, total),
            Err(e) => {
                if !self.fail_load(generation, FailureKind::Fetch) {
                    return None;
                }
                Some(self.emit(ControllerEvent::LoadFailed {
                    collection: self.kind,
                    message: e.to_string(),
                }))
            }
        }
    }

    /// Fetch the next page at the current offset and append it.
    ///
    /// Returns `None` without calling the gateway while in search mode, while
    /// another fetch is outstanding, or once the cursor is exhausted. A failed
    /// fetch disables further load-more until the next refresh.
    pub async fn load_more(&self) -> Option<ControllerEvent> {
        let (generation, offset, page_size) = {
            let mut state = self.state.lock();
            if state.disposed
                || state.search.is_active()
                || state.pagination.loading
                || !state.pagination.has_more
            {
                tracing::debug!(
                    collection = %self.kind,
                    phase = ?state.phase(),
                    has_more = state.pagination.has_more,
                    "load more skipped"
                );
                return None;
            }
            let generation = state.pagination.begin_fetch(false);
            (generation, state.pagination.offset, state.pagination.page_size)
        };

        tracing::debug!(collection = %self.kind, offset, page_size, "loading more rows");
        let result = self.gateway.fetch_page(&self.parent, page_size, offset).await;

        let mut state = self.state.lock();
        if !state.accepts_page(generation) {
            tracing::debug!(collection = %self.kind, offset, "discarding stale page");
            return None;
        }

        let event = match result {
            Ok(rows) => {
                let rows = self.receive(rows);
                state.pagination.append(rows);
                state.sort = None;
                state.error = None;
                ControllerEvent::Loaded {
                    collection: self.kind,
                    rows: state.pagination.rows.len(),
                    total: state.total_count,
                }
            }
            Err(e) => {
                state.pagination.fail();
                state.error = Some(FailureKind::Fetch);
                ControllerEvent::LoadFailed {
                    collection: self.kind,
                    message: e.to_string(),
                }
            }
        };
        drop(state);

        Some(self.emit(event))
    }

    /// Re-fetch the loaded window from position 0 together with the count.
    ///
    /// The whole window is re-derived rather than patched, so `has_more` and
    /// `offset` reflect what the gateway returns now.
    pub async fn reload_window(&self) -> Option<ControllerEvent> {
        let (generation, requested) = {
            let mut state = self.state.lock();
            if state.disposed {
                return None;
            }
            let requested = state.pagination.reload_size();
            (state.pagination.begin_fetch(true), requested)
        };

        tracing::debug!(collection = %self.kind, requested, "reloading window");
        let (rows, total) = futures::join!(
            self.gateway.fetch_page(&self.parent, requested, 0),
            self.gateway.fetch_count(&self.parent)
        );
        let rows = rows.map(|rows| self.receive(rows));

        let mut state = self.state.lock();
        if !state.accepts_page(generation) {
            tracing::debug!(collection = %self.kind, "discarding stale window reload");
            return None;
        }

        let event = match (rows, total) {
            (Ok(rows), Ok(total)) => {
                state.pagination.reload(rows, requested, total);
                state.total_count = total;
                if !state.search.is_active() {
                    state.sort = None;
                }
                ControllerEvent::Loaded {
                    collection: self.kind,
                    rows: state.pagination.rows.len(),
                    total,
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                state.pagination.fail();
                state.error = Some(FailureKind::Fetch);
                ControllerEvent::LoadFailed {
                    collection: self.kind,
                    message: e.to_string(),
                }
            }
        };
        drop(state);

        Some(self.emit(event))
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Record the typed term immediately and arm the debounce.
    ///
    /// An empty (or whitespace) term leaves search mode synchronously: the
    /// pending timer is cancelled and the paginated rows are shown as they
    /// were, without any fetch.
    pub fn set_search_term(&self, term: &str) {
        let query = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            let was_active = state.search.is_active();
            state.search.term = term.to_string();
            if state.search.is_active() {
                if !was_active {
                    state.sort = None;
                }
                Some(state.search.query().to_string())
            } else {
                state.search.rows.clear();
                state.search.in_flight = false;
                if was_active {
                    state.sort = None;
                }
                None
            }
        };

        match query {
            Some(query) => {
                tracing::debug!(collection = %self.kind, term = %query, "search scheduled");
                let this = self.clone();
                self.debouncer.schedule(async move {
                    this.run_search(query).await;
                });
            }
            None => {
                self.debouncer.cancel();
                tracing::debug!(collection = %self.kind, "search cleared");
            }
        }
    }

    /// Re-run the search for the live term right away, bypassing the
    /// debounce. Does nothing outside search mode.
    pub async fn search_now(&self) -> Option<ControllerEvent> {
        let query = {
            let state = self.state.lock();
            state
                .search
                .is_active()
                .then(|| state.search.query().to_string())
        };
        match query {
            Some(query) => self.run_search(query).await,
            None => None,
        }
    }

    /// Send one search request and apply the response only if `term` is
    /// still the live term when it completes.
    async fn run_search(&self, term: String) -> Option<ControllerEvent> {
        {
            let mut state = self.state.lock();
            if !state.accepts_search(&term) {
                tracing::debug!(collection = %self.kind, term = %term, "term changed before search fired");
                return None;
            }
            state.search.in_flight = true;
        }

        let result = self.gateway.search(&self.parent, &term).await;
        let result = result.map(|rows| self.receive(rows));

        let mut state = self.state.lock();
        if !state.accepts_search(&term) {
            tracing::debug!(
                collection = %self.kind,
                term = %term,
                live = %state.search.query(),
                "discarding stale search result"
            );
            return None;
        }

        state.search.in_flight = false;
        state.sort = None;
        let event = match result {
            Ok(rows) => {
                let matches = rows.len();
                state.search.rows = rows;
                state.error = None;
                ControllerEvent::SearchCompleted {
                    collection: self.kind,
                    term,
                    matches,
                }
            }
            Err(e) => {
                state.search.rows.clear();
                state.error = Some(FailureKind::Search);
                ControllerEvent::SearchFailed {
                    collection: self.kind,
                    term,
                    message: e.to_string(),
                }
            }
        };
        drop(state);

        Some(self.emit(event))
    }

    // ------------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------------

    /// Reorder the active rows in place. The inactive array, offsets, and
    /// counts are not touched.
    pub fn apply_sort(&self, field: &str, direction: SortDirection) {
        let mut state = self.state.lock();
        sort_in_place(state.active_rows_mut(), field, direction);
        state.sort = Some(SortSpec {
            field: field.to_string(),
            direction,
        });
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    pub fn stage_edit(&self, edit: DraftEdit) {
        self.state.lock().drafts.stage(edit);
    }

    pub fn cancel_drafts(&self) {
        self.state.lock().drafts.clear();
    }

    pub fn drafts(&self) -> Vec<DraftEdit> {
        self.state.lock().drafts.as_slice().to_vec()
    }

    pub(crate) fn commit_drafts(&self, committed: &[DraftEdit]) {
        self.state.lock().drafts.remove_committed(committed);
    }

    pub(crate) fn discard_draft(&self, id: &RowId) {
        self.state.lock().drafts.discard(id);
    }

    /// Display name of a row in either array, if loaded.
    pub(crate) fn row_name(&self, id: &RowId) -> Option<String> {
        let state = self.state.lock();
        state
            .pagination
            .rows
            .iter()
            .chain(state.search.rows.iter())
            .find(|row| &row.id == id)
            .map(|row| row.display_name().to_string())
    }

    // ------------------------------------------------------------------
    // Resync and lifecycle
    // ------------------------------------------------------------------

    /// Bring the view back in line with the gateway after a write: re-run
    /// the live search if any, reload the paginated window, refresh the count.
    pub async fn resync(&self) -> Vec<ControllerEvent> {
        let (search, window) = futures::join!(self.search_now(), self.reload_window());
        search.into_iter().chain(window).collect()
    }

    /// Drop everything loaded and leave search mode. Fetches in flight become
    /// stale. Drafts are kept.
    pub fn reset(&self) {
        self.debouncer.cancel();
        let mut state = self.state.lock();
        state.pagination.reset();
        state.search.clear();
        state.total_count = 0;
        state.sort = None;
        state.error = None;
    }

    /// Teardown: no timer may fire after this, pending drafts are gone, and
    /// responses still in flight are dropped when they arrive.
    pub fn dispose(&self) {
        self.debouncer.cancel();
        let mut state = self.state.lock();
        state.disposed = true;
        state.drafts.clear();
    }
}
