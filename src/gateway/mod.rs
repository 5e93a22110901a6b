//! Remote data gateway contract.
//!
//! The controller never talks to a data store directly. Each collection is
//! backed by a [`CollectionGateway`] scoped to one entity type, and saves
//! report changed identifiers through a [`CacheNotifier`].

pub mod memory;

use crate::error::Result;
use crate::types::{DraftEdit, ParentId, Row, RowId};

pub use memory::{Dataset, MemoryGateway, MemoryStore, ParentRecord};

/// Paged fetch, count, search, and per-row writes for one collection.
#[async_trait::async_trait]
pub trait CollectionGateway: Send + Sync {
    /// Fetch up to `page_size` rows starting at `offset`, in the server's
    /// default order. Fewer than `page_size` rows means end of data.
    async fn fetch_page(
        &self,
        parent: &ParentId,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Row>>;

    /// Exact number of rows belonging to `parent`.
    async fn fetch_count(&self, parent: &ParentId) -> Result<usize>;

    /// All rows whose search fields contain `term`, unpaginated.
    async fn search(&self, parent: &ParentId, term: &str) -> Result<Vec<Row>>;

    /// Partial field update of a single row. Fails atomically.
    async fn update(&self, edit: &DraftEdit) -> Result<()>;

    async fn delete(&self, id: &RowId) -> Result<()>;
}

/// Receives identifiers of records changed by a save so that any external
/// record cache can invalidate them.
#[async_trait::async_trait]
pub trait CacheNotifier: Send + Sync {
    async fn notify_updated(&self, ids: &[RowId]) -> Result<()>;
}

/// Notifier for deployments without an external record cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait::async_trait]
impl CacheNotifier for NoopNotifier {
    async fn notify_updated(&self, _ids: &[RowId]) -> Result<()> {
        Ok(())
    }
}
