//! Mutation coordinator for the two related collections.
//!
//! [`RelatedLists`] owns one [`CollectionController`] per collection and runs
//! the operations that span both or that write through the gateway: the
//! initial load, save, delete, and refresh. Every operation reports its
//! outcome as a [`ControllerEvent`], both as the return value and on the
//! event bus.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::collection::{CollectionController, CollectionSettings};
use crate::config::Config;
use crate::error::FailureKind;
use crate::events::{ControllerEvent, EventBus};
use crate::gateway::{CacheNotifier, CollectionGateway, MemoryStore};
use crate::types::{CollectionKind, DraftEdit, ParentId, RowId, SortDirection};
use crate::view::CollectionView;

pub type DynCollection = CollectionController<dyn CollectionGateway>;

pub struct RelatedLists {
    parent: ParentId,
    contacts: DynCollection,
    opportunities: DynCollection,
    notifier: Arc<dyn CacheNotifier>,
    events: EventBus,
}

impl RelatedLists {
    pub fn new(
        parent: ParentId,
        contacts: Arc<dyn CollectionGateway>,
        opportunities: Arc<dyn CollectionGateway>,
        notifier: Arc<dyn CacheNotifier>,
        config: &Config,
    ) -> Self {
        let events = EventBus::new();
        let collection = |kind: CollectionKind, gateway: Arc<dyn CollectionGateway>| {
            CollectionController::new(
                kind,
                parent.clone(),
                gateway,
                CollectionSettings::from_config(config, kind),
                events.clone(),
            )
        };

        Self {
            contacts: collection(CollectionKind::Contacts, contacts),
            opportunities: collection(CollectionKind::Opportunities, opportunities),
            parent,
            notifier,
            events,
        }
    }

    /// Controller over both collections of `store`, which also acts as the
    /// cache notifier.
    pub fn from_store(parent: ParentId, store: Arc<MemoryStore>, config: &Config) -> Self {
        let contacts: Arc<dyn CollectionGateway> =
            Arc::new(store.gateway(CollectionKind::Contacts));
        let opportunities: Arc<dyn CollectionGateway> =
            Arc::new(store.gateway(CollectionKind::Opportunities));
        Self::new(parent, contacts, opportunities, store, config)
    }

    pub fn parent(&self) -> &ParentId {
        &self.parent
    }

    pub fn collection(&self, kind: CollectionKind) -> &DynCollection {
        match kind {
            CollectionKind::Contacts => &self.contacts,
            CollectionKind::Opportunities => &self.opportunities,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn view(&self, kind: CollectionKind) -> CollectionView {
        self.collection(kind).view()
    }

    /// Load the first page and count of both collections concurrently.
    ///
    /// Collections are only updated once all four fetches have succeeded. If
    /// any of them fails, nothing is applied and both collections are marked
    /// failed with load-more disabled.
    pub async fn initial_load(&self) -> Vec<ControllerEvent> {
        tracing::debug!(parent = %self.parent, "initial load");
        match self.load_all(FailureKind::Fetch).await {
            Ok(events) => events,
            Err(failures) => failures
                .into_iter()
                .map(|(collection, message)| {
                    let event = ControllerEvent::LoadFailed {
                        collection,
                        message,
                    };
                    self.events.emit(event.clone());
                    event
                })
                .collect(),
        }
    }

    /// Fetch first pages and counts for both collections and apply them all,
    /// or none. On failure returns the message of each failed collection.
    async fn load_all(
        &self,
        failure: FailureKind,
    ) -> Result<Vec<ControllerEvent>, Vec<(CollectionKind, String)>> {
        let generations = (
            self.contacts.begin_initial(),
            self.opportunities.begin_initial(),
        );
        let (contacts, opportunities) = futures::join!(
            self.contacts.fetch_initial(),
            self.opportunities.fetch_initial()
        );

        match (contacts, opportunities) {
            (Ok((c_rows, c_total)), Ok((o_rows, o_total))) => {
                let events = [
                    self.contacts.apply_initial(generations.0, c_rows, c_total),
                    self.opportunities
                        .apply_initial(generations.1, o_rows, o_total),
                ];
                Ok(events.into_iter().flatten().collect())
            }
            (contacts, opportunities) => {
                let outcomes = [
                    (&self.contacts, generations.0, contacts.err()),
                    (&self.opportunities, generations.1, opportunities.err()),
                ];
                let mut failures = Vec::new();
                for (collection, generation, error) in outcomes {
                    let current = collection.fail_load(generation, failure);
                    if let Some(e) = error
                        && current
                    {
                        failures.push((collection.kind(), e.to_string()));
                    }
                }
                Err(failures)
            }
        }
    }

    pub async fn load_more(&self, kind: CollectionKind) -> Option<ControllerEvent> {
        self.collection(kind).load_more().await
    }

    pub fn set_search_term(&self, kind: CollectionKind, term: &str) {
        self.collection(kind).set_search_term(term);
    }

    pub fn apply_sort(&self, kind: CollectionKind, field: &str, direction: SortDirection) {
        self.collection(kind).apply_sort(field, direction);
    }

    pub fn stage_edit(&self, kind: CollectionKind, edit: DraftEdit) {
        self.collection(kind).stage_edit(edit);
    }

    pub fn cancel_drafts(&self, kind: CollectionKind) {
        self.collection(kind).cancel_drafts();
    }

    /// Commit the pending drafts of one collection.
    ///
    /// Updates are sent concurrently. If any of them fails the drafts are kept
    /// and no rows change. On success the committed drafts are cleared, the
    /// cache notifier is told which records changed, and the collection is
    /// resynced before `Saved` is reported.
    pub async fn save(&self, kind: CollectionKind) -> ControllerEvent {
        let collection = self.collection(kind);
        let drafts = collection.drafts();
        if drafts.is_empty() {
            return self.emit(ControllerEvent::NothingToSave { collection: kind });
        }

        tracing::debug!(collection = %kind, count = drafts.len(), "saving drafts");
        let results = futures::future::join_all(
            drafts.iter().map(|edit| collection.gateway().update(edit)),
        )
        .await;

        if let Some(e) = results.into_iter().find_map(|r| r.err()) {
            collection.record_failure(FailureKind::Save);
            return self.emit(ControllerEvent::SaveFailed {
                collection: kind,
                message: e.to_string(),
            });
        }

        collection.commit_drafts(&drafts);
        let ids: Vec<RowId> = drafts.iter().map(|edit| edit.id.clone()).collect();
        if let Err(e) = self.notifier.notify_updated(&ids).await {
            tracing::warn!(collection = %kind, error = %e, "failed to notify record cache");
        }

        collection.resync().await;
        tracing::info!(collection = %kind, updated = ids.len(), "saved drafts");
        self.emit(ControllerEvent::Saved {
            collection: kind,
            updated: ids.len(),
        })
    }

    /// Delete one row, then resync its collection.
    pub async fn delete(&self, kind: CollectionKind, id: &RowId) -> ControllerEvent {
        let collection = self.collection(kind);
        let name = collection
            .row_name(id)
            .unwrap_or_else(|| id.to_string());

        tracing::debug!(collection = %kind, id = %id, "deleting row");
        if let Err(e) = collection.gateway().delete(id).await {
            collection.record_failure(FailureKind::Delete);
            return self.emit(ControllerEvent::DeleteFailed {
                collection: kind,
                id: id.clone(),
                message: e.to_string(),
            });
        }

        collection.discard_draft(id);
        collection.resync().await;
        tracing::info!(collection = %kind, id = %id, "deleted row");
        self.emit(ControllerEvent::Deleted {
            collection: kind,
            id: id.clone(),
            name,
        })
    }

    /// Discard everything loaded in both collections, leave search mode, and
    /// reload from scratch. Pending drafts survive.
    pub async fn refresh(&self) -> ControllerEvent {
        tracing::debug!(parent = %self.parent, "refreshing");
        self.contacts.reset();
        self.opportunities.reset();

        match self.load_all(FailureKind::Refresh).await {
            Ok(_) => self.emit(ControllerEvent::Refreshed),
            Err(failures) => {
                let message = failures
                    .into_iter()
                    .map(|(collection, message)| format!("{collection}: {message}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                self.emit(ControllerEvent::RefreshFailed { message })
            }
        }
    }

    /// Teardown: cancel pending search timers and drop drafts. Responses
    /// still in flight are dropped without touching either collection.
    pub fn dispose(&self) {
        self.contacts.dispose();
        self.opportunities.dispose();
    }

    fn emit(&self, event: ControllerEvent) -> ControllerEvent {
        self.events.emit(event.clone());
        event
    }
}

impl Drop for RelatedLists {
    fn drop(&mut self) {
        self.dispose();
    }
}
