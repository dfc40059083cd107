use super::predicate::compare_values;
use super::QueryExecutor;
use crate::types::{Document, SortDirection, SortField};
use serde_json::Value;
use std::cmp::Ordering;

impl QueryExecutor {
    /// Stable multi-key sort. Documents missing a key sort after the rest
    /// regardless of direction. Values of different kinds order by kind
    /// (booleans, then numbers, then strings) so the comparison stays total.
    pub(crate) fn apply_sort(&self, hits: &mut [&Document], sort: &[SortField]) {
        if sort.is_empty() {
            return;
        }
        hits.sort_by(|a, b| compare_documents(a, b, sort));
    }
}

fn compare_documents(a: &Document, b: &Document, sort: &[SortField]) -> Ordering {
    for key in sort {
        let ord = compare_keys(a.get(&key.field), b.get(&key.field), key.direction);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_keys(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let (a, b) = match (sort_value(a), sort_value(b)) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };
    let ord = kind_rank(a)
        .cmp(&kind_rank(b))
        .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal));
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        _ => 2,
    }
}

/// Arrays sort by their first element.
fn sort_value(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.iter().find(|v| !v.is_null()),
        Value::Object(_) => None,
        v => Some(v),
    }
}
