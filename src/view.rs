use serde::Serialize;

use crate::collection::{CollectionState, Phase};
use crate::error::FailureKind;
use crate::types::{CollectionKind, Row, SortSpec};

/// What a presentation layer needs to render one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionView {
    pub collection: CollectionKind,
    pub label: String,
    pub phase: Phase,
    /// Search results in search mode, otherwise the paginated window
    pub rows: Vec<Row>,
    pub total_count: usize,
    /// Rows fetched along the paginated cursor
    pub loaded: usize,
    pub has_more: bool,
    pub loading: bool,
    pub searching: bool,
    pub search_term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
    pub draft_count: usize,
}

impl CollectionView {
    pub fn from_state(kind: CollectionKind, label: &str, state: &CollectionState) -> Self {
        let phase = state.phase();
        Self {
            collection: kind,
            label: label.to_string(),
            phase,
            rows: state.active_rows().to_vec(),
            total_count: state.total_count,
            loaded: state.pagination.offset,
            has_more: state.pagination.has_more,
            loading: phase == Phase::Loading,
            searching: phase == Phase::Searching,
            search_term: state.search.term.clone(),
            sort: state.sort.clone(),
            error: state.error,
            draft_count: state.drafts.len(),
        }
    }

    /// Heading text, e.g. `Contacts (50 of 120)`.
    pub fn title(&self) -> String {
        if self.phase.is_search() {
            format!("{} ({} matching '{}')", self.label, self.rows.len(), self.search_term.trim())
        } else {
            format!("{} ({} of {})", self.label, self.loaded, self.total_count)
        }
    }
}
