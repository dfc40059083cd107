use super::QueryExecutor;
use crate::types::{Document, FacetStats};
use serde_json::Value;
use std::collections::BTreeMap;

impl QueryExecutor {
    /// Value counts for each requested field over every matching document.
    /// Multi-value fields count each element; fields with no values at all
    /// are left out of the result.
    pub(crate) fn aggregate_facets(
        &self,
        hits: &[&Document],
        fields: &[String],
    ) -> BTreeMap<String, FacetStats> {
        let mut facets = BTreeMap::new();
        for field in fields {
            let mut stats = FacetStats::new();
            for doc in hits {
                match doc.get(field) {
                    Some(Value::Array(items)) => {
                        for item in items {
                            count_value(&mut stats, item);
                        }
                    }
                    Some(value) => count_value(&mut stats, value),
                    None => {}
                }
            }
            if !stats.is_empty() {
                facets.insert(field.clone(), stats);
            }
        }
        facets
    }
}

fn count_value(stats: &mut FacetStats, value: &Value) {
    let key = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return,
    };
    *stats.entry(key).or_insert(0) += 1;
}
