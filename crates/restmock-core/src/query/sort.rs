//! Sort document parsing and stable multi-key sorting.

use crate::query::filter::compare_values;
use crate::store::Item;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

/// Error from sort document parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SortError {
    /// Sort document is not a JSON object.
    #[error("sort document must be a JSON object")]
    NotAnObject,
}

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One field/direction pair of a sort document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Parse a sort document into keys in document order.
///
/// `1` sorts ascending; `-1` or any other value sorts descending.
pub fn parse_sort(doc: &Value) -> Result<Vec<SortKey>, SortError> {
    let map = doc.as_object().ok_or(SortError::NotAnObject)?;
    Ok(map
        .iter()
        .map(|(field, direction)| SortKey {
            field: field.clone(),
            direction: if direction.as_i64() == Some(1) {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            },
        })
        .collect())
}

/// Apply sort keys as independent stable resorts, in document order.
///
/// Each key is a single pass, so with conflicting keys the last one applied
/// wins. Items lacking the field sort before items carrying it (after it
/// when descending); incomparable values compare equal and keep their
/// relative order.
pub fn apply_sort(items: &mut [Item], keys: &[SortKey]) {
    for key in keys {
        items.sort_by(|a, b| {
            let ordering = match (a.get(&key.field), b.get(&key.field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}
