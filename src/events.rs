//! Typed outcome events.
//!
//! The controller reports every operation result as a [`ControllerEvent`]
//! instead of rendering notifications itself. A presentation layer
//! subscribes to the [`EventBus`] and decides how to show them.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::{CollectionKind, RowId};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// Paginated rows and count were (re)loaded
    Loaded {
        collection: CollectionKind,
        rows: usize,
        total: usize,
    },
    LoadFailed {
        collection: CollectionKind,
        message: String,
    },
    /// Results for the live search term were applied
    SearchCompleted {
        collection: CollectionKind,
        term: String,
        matches: usize,
    },
    SearchFailed {
        collection: CollectionKind,
        term: String,
        message: String,
    },
    Saved {
        collection: CollectionKind,
        updated: usize,
    },
    SaveFailed {
        collection: CollectionKind,
        message: String,
    },
    NothingToSave {
        collection: CollectionKind,
    },
    Deleted {
        collection: CollectionKind,
        id: RowId,
        name: String,
    },
    DeleteFailed {
        collection: CollectionKind,
        id: RowId,
        message: String,
    },
    Refreshed,
    RefreshFailed {
        message: String,
    },
}

impl ControllerEvent {
    pub fn collection(&self) -> Option<CollectionKind> {
        match self {
            ControllerEvent::Loaded { collection, .. }
            | ControllerEvent::LoadFailed { collection, .. }
            | ControllerEvent::SearchCompleted { collection, .. }
            | ControllerEvent::SearchFailed { collection, .. }
            | ControllerEvent::Saved { collection, .. }
            | ControllerEvent::SaveFailed { collection, .. }
            | ControllerEvent::NothingToSave { collection }
            | ControllerEvent::Deleted { collection, .. }
            | ControllerEvent::DeleteFailed { collection, .. } => Some(*collection),
            ControllerEvent::Refreshed | ControllerEvent::RefreshFailed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ControllerEvent::LoadFailed { .. }
                | ControllerEvent::SearchFailed { .. }
                | ControllerEvent::SaveFailed { .. }
                | ControllerEvent::DeleteFailed { .. }
                | ControllerEvent::RefreshFailed { .. }
        )
    }

    /// One-line human readable summary
    pub fn message(&self) -> String {
        match self {
            ControllerEvent::Loaded {
                collection,
                rows,
                total,
            } => format!("Loaded {rows} of {total} {collection}"),
            ControllerEvent::LoadFailed {
                collection,
                message,
            } => format!("Failed to load {collection}: {message}"),
            ControllerEvent::SearchCompleted {
                collection,
                term,
                matches,
            } => format!("{matches} {collection} match '{term}'"),
            ControllerEvent::SearchFailed {
                collection,
                term,
                message,
            } => format!("Search for '{term}' in {collection} failed: {message}"),
            ControllerEvent::Saved {
                collection,
                updated,
            } => format!("Saved {updated} {collection} record(s)"),
            ControllerEvent::SaveFailed {
                collection,
                message,
            } => format!("Failed to save {collection}: {message}"),
            ControllerEvent::NothingToSave { collection } => {
                format!("No pending {collection} edits")
            }
            ControllerEvent::Deleted {
                collection, name, ..
            } => format!("Deleted {name} from {collection}"),
            ControllerEvent::DeleteFailed {
                collection,
                id,
                message,
            } => format!("Failed to delete {id} from {collection}: {message}"),
            ControllerEvent::Refreshed => "Refreshed".to_string(),
            ControllerEvent::RefreshFailed { message } => format!("Refresh failed: {message}"),
        }
    }
}

/// Broadcast channel for outcome events. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ControllerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: ControllerEvent) {
        if event.is_failure() {
            tracing::warn!(collection = ?event.collection(), "{}", event.message());
        } else {
            tracing::debug!(collection = ?event.collection(), "{}", event.message());
        }
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
