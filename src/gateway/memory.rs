//! In-memory gateway over a dataset file.
//!
//! Backs the CLI and the tests. Rows are served in dataset order, search is a
//! case-insensitive substring match over the configured fields, and writes
//! mutate the shared store so both collections see a consistent picture.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CacheNotifier, CollectionGateway};
use crate::config::{CollectionConfig, Config};
use crate::error::{RelatedListsError, Result};
use crate::types::{CollectionKind, DraftEdit, ParentId, Row, RowId};

/// Parent records and their related rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub parents: Vec<ParentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRecord {
    pub id: ParentId,
    #[serde(default)]
    pub contacts: Vec<Row>,
    #[serde(default)]
    pub opportunities: Vec<Row>,
}

impl ParentRecord {
    pub fn new(id: impl Into<ParentId>) -> Self {
        Self {
            id: id.into(),
            contacts: Vec::new(),
            opportunities: Vec::new(),
        }
    }

    pub fn rows(&self, kind: CollectionKind) -> &Vec<Row> {
        match kind {
            CollectionKind::Contacts => &self.contacts,
            CollectionKind::Opportunities => &self.opportunities,
        }
    }

    pub fn rows_mut(&mut self, kind: CollectionKind) -> &mut Vec<Row> {
        match kind {
            CollectionKind::Contacts => &mut self.contacts,
            CollectionKind::Opportunities => &mut self.opportunities,
        }
    }
}

impl Dataset {
    /// Load a dataset from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelatedListsError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read dataset at {}: {}", path.display(), e),
            ))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml_ng::from_str(&content)?)
        }
    }
}

/// Case-insensitive substring match.
///
/// Uses `unicase` for Unicode case folding rather than ASCII lowercasing.
fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack_folded = unicase::UniCase::new(haystack).to_folded_case();
    let needle_folded = unicase::UniCase::new(needle).to_folded_case();
    haystack_folded.contains(&needle_folded)
}

fn field_matches(value: &Value, term: &str) -> bool {
    match value {
        Value::String(s) => contains_case_insensitive(s, term),
        Value::Number(n) => contains_case_insensitive(&n.to_string(), term),
        Value::Bool(b) => contains_case_insensitive(&b.to_string(), term),
        _ => false,
    }
}

/// Shared in-memory store. Hand out per-collection gateways with
/// [`MemoryStore::gateway`].
pub struct MemoryStore {
    data: RwLock<Dataset>,
    search_fields: HashMap<CollectionKind, Vec<String>>,
    latency: Duration,
    notified: Mutex<Vec<RowId>>,
}

impl MemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        let search_fields = HashMap::from([
            (
                CollectionKind::Contacts,
                CollectionConfig::contacts().search_fields,
            ),
            (
                CollectionKind::Opportunities,
                CollectionConfig::opportunities().search_fields,
            ),
        ]);

        Self {
            data: RwLock::new(dataset),
            search_fields,
            latency: Duration::ZERO,
            notified: Mutex::new(Vec::new()),
        }
    }

    /// Store using the search fields and simulated latency from `config`.
    pub fn from_config(dataset: Dataset, config: &Config) -> Self {
        let mut store = Self::new(dataset).with_latency(config.simulated_latency());
        for kind in CollectionKind::ALL {
            store
                .search_fields
                .insert(kind, config.collection(kind).search_fields.clone());
        }
        store
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn gateway(self: &Arc<Self>, kind: CollectionKind) -> MemoryGateway {
        MemoryGateway {
            store: Arc::clone(self),
            kind,
        }
    }

    pub fn has_parent(&self, parent: &ParentId) -> bool {
        self.data.read().parents.iter().any(|p| &p.id == parent)
    }

    /// Current server-side rows of one collection.
    pub fn rows(&self, parent: &ParentId, kind: CollectionKind) -> Vec<Row> {
        self.data
            .read()
            .parents
            .iter()
            .find(|p| &p.id == parent)
            .map(|p| p.rows(kind).clone())
            .unwrap_or_default()
    }

    /// Identifiers passed to `notify_updated`, in call order.
    pub fn notified(&self) -> Vec<RowId> {
        self.notified.lock().clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn with_parent<T>(
        &self,
        parent: &ParentId,
        kind: CollectionKind,
        f: impl FnOnce(&[Row]) -> T,
    ) -> Result<T> {
        let data = self.data.read();
        let record = data
            .parents
            .iter()
            .find(|p| &p.id == parent)
            .ok_or_else(|| RelatedListsError::ParentNotFound(parent.clone()))?;
        Ok(f(record.rows(kind)))
    }

    fn search_fields(&self, kind: CollectionKind) -> &[String] {
        self.search_fields
            .get(&kind)
            .map(|fields| fields.as_slice())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CacheNotifier for MemoryStore {
    async fn notify_updated(&self, ids: &[RowId]) -> Result<()> {
        self.notified.lock().extend_from_slice(ids);
        Ok(())
    }
}

/// One collection of a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryGateway {
    store: Arc<MemoryStore>,
    kind: CollectionKind,
}

#[async_trait::async_trait]
impl CollectionGateway for MemoryGateway {
    async fn fetch_page(
        &self,
        parent: &ParentId,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Row>> {
        self.store.simulate_latency().await;
        self.store.with_parent(parent, self.kind, |rows| {
            rows.iter().skip(offset).take(page_size).cloned().collect()
        })
    }

    async fn fetch_count(&self, parent: &ParentId) -> Result<usize> {
        self.store.simulate_latency().await;
        self.store.with_parent(parent, self.kind, |rows| rows.len())
    }

    async fn search(&self, parent: &ParentId, term: &str) -> Result<Vec<Row>> {
        self.store.simulate_latency().await;
        let fields = self.store.search_fields(self.kind);
        self.store.with_parent(parent, self.kind, |rows| {
            rows.iter()
                .filter(|row| {
                    fields
                        .iter()
                        .filter_map(|f| row.field(f))
                        .any(|v| field_matches(v, term))
                })
                .cloned()
                .collect()
        })
    }

    async fn update(&self, edit: &DraftEdit) -> Result<()> {
        self.store.simulate_latency().await;
        let mut data = self.store.data.write();
        let row = data
            .parents
            .iter_mut()
            .flat_map(|p| p.rows_mut(self.kind).iter_mut())
            .find(|row| row.id == edit.id)
            .ok_or_else(|| RelatedListsError::RowNotFound(edit.id.clone()))?;
        row.apply(edit);
        Ok(())
    }

    async fn delete(&self, id: &RowId) -> Result<()> {
        self.store.simulate_latency().await;
        let mut data = self.store.data.write();
        for parent in data.parents.iter_mut() {
            let rows = parent.rows_mut(self.kind);
            if let Some(pos) = rows.iter().position(|row| &row.id == id) {
                rows.remove(pos);
                return Ok(());
            }
        }
        Err(RelatedListsError::RowNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Arc<MemoryStore> {
        let mut parent = ParentRecord::new("001A");
        parent.contacts = vec![
            Row::new("003A").with("name", "Ada Lovelace").with("email", "ada@example.com"),
            Row::new("003B").with("name", "Grace Hopper").with("title", "Rear Admiral"),
            Row::new("003C").with("name", "Alan Turing").with("phone", "555-0100"),
        ];
        parent.opportunities = vec![Row::new("006A").with("name", "Renewal").with("amount", 900)];
        Arc::new(MemoryStore::new(Dataset {
            parents: vec![parent],
        }))
    }

    #[tokio::test]
    async fn test_fetch_page_windows() {
        let store = store();
        let gw = store.gateway(CollectionKind::Contacts);
        let parent = ParentId::from("001A");

        let first = gw.fetch_page(&parent, 2, 0).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, RowId::from("003A"));

        let rest = gw.fetch_page(&parent, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, RowId::from("003C"));

        assert!(gw.fetch_page(&parent, 2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_parent_is_error() {
        let store = store();
        let gw = store.gateway(CollectionKind::Contacts);
        let result = gw.fetch_count(&ParentId::from("nope")).await;
        assert!(matches!(result, Err(RelatedListsError::ParentNotFound(_))));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_across_fields() {
        let store = store();
        let gw = store.gateway(CollectionKind::Contacts);
        let parent = ParentId::from("001A");

        let by_name = gw.search(&parent, "ALAN").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, RowId::from("003C"));

        let by_title = gw.search(&parent, "admiral").await.unwrap();
        assert_eq!(by_title[0].id, RowId::from("003B"));

        let by_phone = gw.search(&parent, "0100").await.unwrap();
        assert_eq!(by_phone[0].id, RowId::from("003C"));

        // "a" appears in every name
        assert_eq!(gw.search(&parent, "a").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_ignores_fields_outside_config() {
        let store = store();
        let gw = store.gateway(CollectionKind::Opportunities);
        // amount is not an opportunity search field
        assert!(gw.search(&ParentId::from("001A"), "900").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = store();
        let gw = store.gateway(CollectionKind::Contacts);
        let parent = ParentId::from("001A");

        gw.update(&DraftEdit::new("003B").set("title", "Admiral"))
            .await
            .unwrap();
        let rows = store.rows(&parent, CollectionKind::Contacts);
        assert_eq!(rows[1].field("title"), Some(&json!("Admiral")));

        gw.delete(&RowId::from("003A")).await.unwrap();
        assert_eq!(gw.fetch_count(&parent).await.unwrap(), 2);

        let missing = gw.delete(&RowId::from("003A")).await;
        assert!(matches!(missing, Err(RelatedListsError::RowNotFound(_))));
    }

    #[tokio::test]
    async fn test_notifier_records_ids() {
        let store = store();
        store
            .notify_updated(&[RowId::from("003A"), RowId::from("003B")])
            .await
            .unwrap();
        assert_eq!(store.notified().len(), 2);
    }

    #[test]
    fn test_dataset_load_yaml_and_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let yaml = tmp.path().join("data.yaml");
        fs::write(
            &yaml,
            "parents:\n  - id: 001A\n    contacts:\n      - id: 003A\n        name: Ada\n",
        )
        .unwrap();
        let dataset = Dataset::load(&yaml).unwrap();
        assert_eq!(dataset.parents[0].contacts[0].display_name(), "Ada");
        assert!(dataset.parents[0].opportunities.is_empty());

        let json_path = tmp.path().join("data.json");
        fs::write(
            &json_path,
            r#"{"parents":[{"id":"001B","opportunities":[{"id":"006A","name":"Deal"}]}]}"#,
        )
        .unwrap();
        let dataset = Dataset::load(&json_path).unwrap();
        assert_eq!(dataset.parents[0].opportunities.len(), 1);
    }
}
