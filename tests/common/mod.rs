#![allow(dead_code)]

use serde_json::{json, Value};
use unsearch::{Document, Index, Memory, MemoryConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn doc(json: Value) -> Document {
    Document::from_json(json).unwrap()
}

pub fn ids(records: &[Document]) -> Vec<&str> {
    records.iter().map(|d| d.id()).collect()
}

/// A small apparel catalog with scalar, array and missing fields.
pub fn catalog() -> Vec<Document> {
    vec![
        doc(json!({"id": "shirt-red", "title": "Red Shirt", "category": "shirts", "price": 25, "tags": ["sale", "summer"]})),
        doc(json!({"id": "shirt-blue", "title": "Blue Shirt", "category": "shirts", "price": 30, "tags": ["summer"]})),
        doc(json!({"id": "pants", "title": "Cargo Pants", "category": "clothing", "price": 45, "tags": ["fall"]})),
        doc(json!({"id": "socks", "title": "Wool Socks", "category": "clothing", "price": 8, "tags": ["fall", "sale"]})),
        doc(json!({"id": "hat", "title": "Sun Hat", "category": "accessories"})),
        doc(json!({"id": "products/scarf", "title": "Silk Scarf", "category": "accessories", "price": 60})),
    ]
}

pub fn memory_index(page_size: usize) -> Index {
    Index::new(Memory::with_documents(
        MemoryConfig {
            page_size,
            keys: vec!["title".to_string(), "tags".to_string()],
            ..MemoryConfig::default()
        },
        catalog(),
    ))
}

/// `count` documents with ids `doc-00`, `doc-01`, ... and an integer `n`.
pub fn numbered(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| doc(json!({"id": format!("doc-{:02}", i), "title": format!("Item {}", i), "n": i})))
        .collect()
}
