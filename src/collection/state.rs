//! State types for a single collection

use serde::Serialize;

use crate::error::FailureKind;
use crate::types::{DraftEdit, Row, RowId, SortSpec};

/// Where the visible rows of a collection currently come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Paginated view, no fetch outstanding
    Idle,
    /// Paginated view with a page or window fetch outstanding
    Loading,
    /// Search view with a request for the live term outstanding
    Searching,
    /// Search view showing the last applied results
    SearchIdle,
}

impl Phase {
    pub fn is_search(self) -> bool {
        matches!(self, Phase::Searching | Phase::SearchIdle)
    }
}

/// Paginated cursor over the collection.
///
/// `offset` always equals `rows.len()`: it counts the rows fetched along the
/// cursor so far.
#[derive(Debug, Clone)]
pub struct PaginationState {
    pub offset: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub rows: Vec<Row>,
    pub loading: bool,
    /// Bumped whenever the window is replaced; fetches started under an older
    /// generation are discarded on completion.
    pub generation: u64,
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size,
            has_more: true,
            rows: Vec::new(),
            loading: false,
            generation: 0,
        }
    }

    /// Back to an empty cursor. Any fetch in flight becomes stale.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.has_more = true;
        self.rows.clear();
        self.loading = false;
        self.generation += 1;
    }

    /// Start a fetch and return the generation it belongs to. Replacing the
    /// window (initial load, reload) invalidates earlier fetches; appending does not.
    pub fn begin_fetch(&mut self, replaces_window: bool) -> u64 {
        if replaces_window {
            self.generation += 1;
        }
        self.loading = true;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Append a page fetched at the current offset.
    pub fn append(&mut self, rows: Vec<Row>) {
        let fetched = rows.len();
        self.rows.extend(rows);
        self.offset += fetched;
        self.has_more = fetched == self.page_size;
        self.loading = false;
    }

    /// Replace the window with rows re-fetched from position 0.
    pub fn replace(&mut self, rows: Vec<Row>, requested: usize) {
        self.offset = rows.len();
        self.has_more = rows.len() == requested;
        self.rows = rows;
        self.loading = false;
    }

    /// Replace the window after a reload. The exact count fetched alongside
    /// caps the cursor, so a window that already holds every row stays
    /// exhausted.
    pub fn reload(&mut self, rows: Vec<Row>, requested: usize, total: usize) {
        self.replace(rows, requested);
        self.has_more = self.has_more && self.offset < total;
    }

    /// A failed fetch leaves applied rows alone and disables load-more.
    pub fn fail(&mut self) {
        self.has_more = false;
        self.loading = false;
    }

    /// Number of rows a window reload asks for: the loaded window, or one
    /// page when nothing is loaded yet.
    pub fn reload_size(&self) -> usize {
        self.offset.max(self.page_size)
    }
}

/// Server-side search over the collection.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Live term exactly as typed
    pub term: String,
    /// Results of the last completed request whose term matched the live term
    pub rows: Vec<Row>,
    /// A request for the live term is outstanding
    pub in_flight: bool,
}

impl SearchState {
    /// The term a request should be sent for
    pub fn query(&self) -> &str {
        self.term.trim()
    }

    pub fn is_active(&self) -> bool {
        !self.query().is_empty()
    }

    /// Whether a response for `term` may still be applied
    pub fn accepts(&self, term: &str) -> bool {
        self.is_active() && self.query() == term
    }

    pub fn clear(&mut self) {
        self.term.clear();
        self.rows.clear();
        self.in_flight = false;
    }
}

/// Ordered pending edits, at most one entry per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftEdits {
    edits: Vec<DraftEdit>,
}

impl DraftEdits {
    /// Merge `edit` into the entry for its row, keeping first-edit order.
    pub fn stage(&mut self, edit: DraftEdit) {
        match self.edits.iter_mut().find(|e| e.id == edit.id) {
            Some(existing) => existing.fields.extend(edit.fields),
            None => self.edits.push(edit),
        }
    }

    pub fn as_slice(&self) -> &[DraftEdit] {
        &self.edits
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.edits.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn discard(&mut self, id: &RowId) {
        self.edits.retain(|edit| &edit.id != id);
    }

    /// Drop the entries that were committed, leaving anything staged since.
    pub fn remove_committed(&mut self, committed: &[DraftEdit]) {
        self.edits.retain(|edit| !committed.contains(edit));
    }
}

/// Everything the controller tracks for one collection.
#[derive(Debug, Clone)]
pub struct CollectionState {
    pub pagination: PaginationState,
    pub search: SearchState,
    pub total_count: usize,
    pub drafts: DraftEdits,
    pub sort: Option<SortSpec>,
    pub error: Option<FailureKind>,
    /// Set by teardown; nothing may change the rows afterwards.
    pub disposed: bool,
}

impl CollectionState {
    pub fn new(page_size: usize) -> Self {
        Self {
            pagination: PaginationState::new(page_size),
            search: SearchState::default(),
            total_count: 0,
            drafts: DraftEdits::default(),
            sort: None,
            error: None,
            disposed: false,
        }
    }

    /// Whether a page fetched under `generation` may still be applied
    pub fn accepts_page(&self, generation: u64) -> bool {
        !self.disposed && self.pagination.is_current(generation)
    }

    /// Whether a search response for `term` may still be applied
    pub fn accepts_search(&self, term: &str) -> bool {
        !self.disposed && self.search.accepts(term)
    }

    pub fn phase(&self) -> Phase {
        match (self.search.is_active(), self.search.in_flight) {
            (true, true) => Phase::Searching,
            (true, false) => Phase::SearchIdle,
            (false, _) if self.pagination.loading => Phase::Loading,
            (false, _) => Phase::Idle,
        }
    }

    /// Search results in search mode, otherwise the paginated rows. The two
    /// are never merged.
    pub fn active_rows(&self) -> &[Row] {
        if self.search.is_active() {
            &self.search.rows
        } else {
            &self.pagination.rows
        }
    }

    pub fn active_rows_mut(&mut self) -> &mut Vec<Row> {
        if self.search.is_active() {
            &mut self.search.rows
        } else {
            &mut self.pagination.rows
        }
    }
}
