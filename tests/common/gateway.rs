//! Gateway wrapper for driving race and failure scenarios.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use related_lists::gateway::MemoryGateway;
use related_lists::{CollectionGateway, DraftEdit, ParentId, RelatedListsError, Result, Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchPage,
    FetchCount,
    Search,
    Update,
    Delete,
}

/// Delegates to a [`MemoryGateway`], with injectable failures and per-term
/// search latency. Records every call it receives.
pub struct ScriptedGateway {
    inner: MemoryGateway,
    failing: Mutex<HashSet<Op>>,
    failing_ids: Mutex<HashSet<RowId>>,
    search_latency: Mutex<HashMap<String, Duration>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<(Op, String)>>,
}

impl ScriptedGateway {
    pub fn new(inner: MemoryGateway) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            failing_ids: Mutex::new(HashSet::new()),
            search_latency: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every call of `op` fail until [`ScriptedGateway::recover`].
    pub fn fail(&self, op: Op) {
        self.failing.lock().insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().remove(&op);
    }

    /// Fail updates and deletes of one row only.
    pub fn fail_row(&self, id: &str) {
        self.failing_ids.lock().insert(RowId::from(id));
    }

    pub fn set_search_latency(&self, term: &str, latency: Duration) {
        self.search_latency.lock().insert(term.to_string(), latency);
    }

    /// Delay applied to every call
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().iter().filter(|(o, _)| *o == op).count()
    }

    /// Terms passed to `search`, in call order
    pub fn search_terms(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(o, _)| *o == Op::Search)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    async fn enter(&self, op: Op, arg: String, extra: Duration) -> Result<()> {
        self.calls.lock().push((op, arg.clone()));
        let delay = *self.latency.lock() + extra;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().contains(&op) {
            return Err(RelatedListsError::Gateway(format!("{op:?} unavailable")));
        }
        if self.failing_ids.lock().contains(&RowId::from(arg.as_str())) {
            return Err(RelatedListsError::Gateway(format!("{arg} is locked")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CollectionGateway for ScriptedGateway {
    async fn fetch_page(
        &self,
        parent: &ParentId,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Row>> {
        self.enter(Op::FetchPage, format!("{offset}+{page_size}"), Duration::ZERO)
            .await?;
        self.inner.fetch_page(parent, page_size, offset).await
    }

    async fn fetch_count(&self, parent: &ParentId) -> Result<usize> {
        self.enter(Op::FetchCount, parent.to_string(), Duration::ZERO)
            .await?;
        self.inner.fetch_count(parent).await
    }

    async fn search(&self, parent: &ParentId, term: &str) -> Result<Vec<Row>> {
        let extra = self
            .search_latency
            .lock()
            .get(term)
            .copied()
            .unwrap_or_default();
        self.enter(Op::Search, term.to_string(), extra).await?;
        self.inner.search(parent, term).await
    }

    async fn update(&self, edit: &DraftEdit) -> Result<()> {
        self.enter(Op::Update, edit.id.to_string(), Duration::ZERO)
            .await?;
        self.inner.update(edit).await
    }

    async fn delete(&self, id: &RowId) -> Result<()> {
        self.enter(Op::Delete, id.to_string(), Duration::ZERO).await?;
        self.inner.delete(id).await
    }
}
