//! Client-side ordering of displayed rows.
//!
//! Sorting never touches offsets, counts, or the gateway. It reorders the
//! rows currently held in memory and is not reapplied when new rows arrive.

use std::cmp::Ordering;

use serde_json::Value;

use crate::types::{Row, SortDirection};

/// Comparable projection of a field value.
///
/// Two numbers compare numerically and two texts compare case-folded, with
/// missing and null values treated as the empty string. Across kinds the
/// order is fixed: empty text, then numbers, then non-empty text.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n
                .as_f64()
                .map(SortKey::Number)
                .unwrap_or_else(|| SortKey::Text(n.to_string())),
            Some(Value::String(s)) => SortKey::Text(fold(s)),
            Some(Value::Bool(b)) => SortKey::Text(b.to_string()),
            Some(Value::Null) | None => SortKey::Text(String::new()),
            Some(other) => SortKey::Text(fold(&other.to_string())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Text(s) if s.is_empty() => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

fn fold(s: &str) -> String {
    unicase::UniCase::new(s).to_folded_case()
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

/// Compare two rows on `field` in the given direction.
pub fn compare_rows(a: &Row, b: &Row, field: &str, direction: SortDirection) -> Ordering {
    let ordering = compare_keys(&SortKey::of(a.field(field)), &SortKey::of(b.field(field)));
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Stable in-place sort. Rows with equal keys keep their relative order in
/// both directions.
pub fn sort_in_place(rows: &mut [Row], field: &str, direction: SortDirection) {
    rows.sort_by(|a, b| compare_rows(a, b, field, direction));
}

/// Pure form: `(rows, field, direction) -> rows'`.
pub fn sort_rows(mut rows: Vec<Row>, field: &str, direction: SortDirection) -> Vec<Row> {
    sort_in_place(&mut rows, field, direction);
    rows
}
