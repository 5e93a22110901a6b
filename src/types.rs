use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RelatedListsError;

/// Field holding the human-readable name of a row.
pub const NAME_FIELD: &str = "name";

/// Stable identifier of a row in either collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        RowId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId(s)
    }
}

/// Identifier of the parent record both collections belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentId(String);

impl ParentId {
    pub fn new(id: impl Into<String>) -> Self {
        ParentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParentId {
    fn from(s: &str) -> Self {
        ParentId(s.to_string())
    }
}

/// An opaque record. Only `id` and the derived `link` are interpreted;
/// every other field passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    /// Navigation target derived from the id when the row is received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Row {
            id: id.into(),
            link: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter, mostly useful for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The `name` field as text, falling back to the id.
    pub fn display_name(&self) -> &str {
        match self.fields.get(NAME_FIELD) {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => self.id.as_str(),
        }
    }

    /// Merge a partial edit into this row.
    pub fn apply(&mut self, edit: &DraftEdit) {
        for (field, value) in &edit.fields {
            self.fields.insert(field.clone(), value.clone());
        }
    }
}

/// A pending partial-row edit, keyed by row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEdit {
    pub id: RowId,
    pub fields: BTreeMap<String, Value>,
}

impl DraftEdit {
    pub fn new(id: impl Into<RowId>) -> Self {
        DraftEdit {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Parse `field=value` assignments into an edit.
    ///
    /// Values that are valid JSON (numbers, booleans, quoted strings, null) keep
    /// their JSON type; anything else is taken as a plain string.
    pub fn parse(id: impl Into<RowId>, assignments: &[&str]) -> Result<Self, RelatedListsError> {
        if assignments.is_empty() {
            return Err(RelatedListsError::InvalidEdit(
                "expected at least one field=value".to_string(),
            ));
        }

        let mut edit = DraftEdit::new(id);
        for assignment in assignments {
            let (field, raw) = assignment.split_once('=').ok_or_else(|| {
                RelatedListsError::InvalidEdit(format!("'{assignment}' is not field=value"))
            })?;
            let field = field.trim();
            if field.is_empty() || field == "id" || field == "link" {
                return Err(RelatedListsError::InvalidEdit(format!(
                    "field '{field}' cannot be edited"
                )));
            }
            let value = serde_json::from_str::<Value>(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            edit.fields.insert(field.to_string(), value);
        }
        Ok(edit)
    }
}

/// The two related collections shown under a parent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Contacts,
    Opportunities,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 2] = [CollectionKind::Contacts, CollectionKind::Opportunities];
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Contacts => write!(f, "contacts"),
            CollectionKind::Opportunities => write!(f, "opportunities"),
        }
    }
}

impl FromStr for CollectionKind {
    type Err = RelatedListsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contacts" | "contact" | "c" => Ok(CollectionKind::Contacts),
            "opportunities" | "opportunity" | "o" => Ok(CollectionKind::Opportunities),
            _ => Err(RelatedListsError::InvalidCommand(format!(
                "unknown collection '{s}', expected 'contacts' or 'opportunities'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = RelatedListsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(RelatedListsError::InvalidCommand(format!(
                "unknown sort direction '{s}', expected 'asc' or 'desc'"
            ))),
        }
    }
}

/// Sort indicator: which field the active rows were last ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}
