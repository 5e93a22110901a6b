use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::{ParentId, RowId};

#[derive(Error, Debug)]
pub enum RelatedListsError {
    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("row '{0}' not found")]
    RowNotFound(RowId),

    #[error("parent record '{0}' not found")]
    ParentNotFound(ParentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelatedListsError>;

/// Operation-level failure categories surfaced to the presentation layer.
///
/// Each collection carries at most one of these as its error flag. The flag is
/// cleared by the next successful operation on that collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Initial load, load-more, or window reload failed
    Fetch,
    /// A search for the live term failed
    Search,
    /// A batch of draft edits was rejected
    Save,
    /// A row delete was rejected
    Delete,
    /// The full reset-and-reload failed
    Refresh,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Fetch => write!(f, "fetch failed"),
            FailureKind::Search => write!(f, "search failed"),
            FailureKind::Save => write!(f, "save failed"),
            FailureKind::Delete => write!(f, "delete failed"),
            FailureKind::Refresh => write!(f, "refresh failed"),
        }
    }
}
