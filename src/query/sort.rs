use crate::types::{SoftFacets, SoftSort, SortField, SortKey};

/// Resolve loosely-typed sort input into ordered `{field, direction}` keys.
/// Omitted directions default to ascending; no input is an empty sort.
pub fn normalize_sort(sort: Option<&SoftSort>) -> Vec<SortField> {
    match sort {
        None => Vec::new(),
        Some(SoftSort::One(field)) => vec![SortField::asc(field.as_str())],
        Some(SoftSort::Many(keys)) => keys
            .iter()
            .map(|key| match key {
                SortKey::Name(field) => SortField::asc(field.as_str()),
                SortKey::Field { field, direction } => SortField {
                    field: field.clone(),
                    direction: direction.unwrap_or_default(),
                },
            })
            .collect(),
    }
}

pub fn normalize_facets(facets: Option<&SoftFacets>) -> Vec<String> {
    match facets {
        None => Vec::new(),
        Some(SoftFacets::One(field)) => vec![field.clone()],
        Some(SoftFacets::Many(fields)) => fields.clone(),
    }
}

/// `field:direction` pairs, the form MeiliSearch and Typesense both accept.
pub fn sort_strings(sort: &[SortField]) -> Vec<String> {
    sort.iter()
        .map(|s| format!("{}:{}", s.field, s.direction.as_str()))
        .collect()
}
