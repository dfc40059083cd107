mod common;

use async_trait::async_trait;
use common::{doc, init_tracing};
use serde_json::json;
use serial_test::serial;
use std::sync::{Arc, Mutex};
use unsearch::query::filter::{and, eq, lt};
use unsearch::{
    Adapter, AdapterConfig, Document, Index, MemoryConfig, SearchOptions, SearchResult,
    SoftSearchOptions, SortField, UnsearchError,
};

/// Records every call it receives.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
    last_options: Mutex<Option<SearchOptions>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Adapter for Recorder {
    async fn get(&self, id: &str) -> unsearch::Result<Option<Document>> {
        self.record(format!("get {}", id));
        Ok(None)
    }

    async fn search(&self, query: &str, options: SearchOptions) -> unsearch::Result<SearchResult> {
        self.record(format!("search {}", query));
        *self.last_options.lock().unwrap() = Some(options.clone());
        Ok(SearchResult::empty(query, options))
    }

    async fn submit(&self, documents: Vec<Document>) -> unsearch::Result<()> {
        self.record(format!("submit {}", documents.len()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> unsearch::Result<()> {
        self.record(format!("delete {}", id));
        Ok(())
    }

    async fn swap(&self, new_index: &str) -> unsearch::Result<()> {
        self.record(format!("swap {}", new_index));
        Ok(())
    }

    async fn clear(&self) -> unsearch::Result<()> {
        self.record("clear".to_string());
        Ok(())
    }
}

fn recorder_index() -> (Arc<Recorder>, Index) {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let index = Index::with_adapter(recorder.clone());
    (recorder, index)
}

#[tokio::test]
async fn test_empty_submit_never_reaches_adapter() {
    let (recorder, index) = recorder_index();
    index.submit(Vec::<Document>::new()).await.unwrap();
    assert!(recorder.calls().is_empty());

    index.submit([doc(json!({"id": "a"}))]).await.unwrap();
    assert_eq!(recorder.calls(), vec!["submit 1"]);
}

#[tokio::test]
async fn test_calls_are_forwarded() {
    let (recorder, index) = recorder_index();
    index.get("a").await.unwrap();
    index.delete("a").await.unwrap();
    index.swap("next").await.unwrap();
    index.clear().await.unwrap();
    assert_eq!(recorder.calls(), vec!["get a", "delete a", "swap next", "clear"]);
}

#[tokio::test]
async fn test_search_options_are_normalized() {
    let (recorder, index) = recorder_index();
    let options: SoftSearchOptions = serde_json::from_value(json!({
        "page": "3",
        "sort": ["title", {"field": "price", "direction": "desc"}],
        "facets": "tags",
        "filters": [{"op": "=", "field": "category", "value": "shirts"}, {"price": {"lt": 50}}]
    }))
    .unwrap();

    let result = index.search("hat", options).await.unwrap();
    let sent = recorder.last_options.lock().unwrap().clone().unwrap();

    assert_eq!(sent.page, 3);
    assert_eq!(sent.sort, vec![SortField::asc("title"), SortField::desc("price")]);
    assert_eq!(sent.facets, vec!["tags"]);
    assert_eq!(sent.filters, Some(and([eq("category", "shirts"), lt("price", 50)])));
    assert_eq!(result.page, 3);
    assert_eq!(result.query, "hat");
}

#[tokio::test]
async fn test_bad_options_fail_before_the_adapter() {
    let (recorder, index) = recorder_index();

    let err = index
        .search("", SoftSearchOptions::new().page("abc"))
        .await
        .unwrap_err();
    assert!(matches!(err, UnsearchError::InvalidOptions(_)));

    let bad_filter = unsearch::FilterInput::from_json(json!({"price": {}})).unwrap();
    let err = index
        .search("", SoftSearchOptions::new().filters(bad_filter))
        .await
        .unwrap_err();
    assert!(matches!(err, UnsearchError::Config(_)));

    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_from_config_builds_memory_index() {
    let config: AdapterConfig = serde_json::from_value(json!({
        "adapter": "memory",
        "page_size": 2,
        "keys": ["title"]
    }))
    .unwrap();
    assert_eq!(
        config,
        AdapterConfig::Memory(MemoryConfig {
            page_size: 2,
            keys: vec!["title".to_string()],
            ..MemoryConfig::default()
        })
    );

    let index = Index::from_config(&config).unwrap();
    index.submit(common::catalog()).await.unwrap();
    let result = index.search("shirt", SoftSearchOptions::new()).await.unwrap();
    assert_eq!(result.total.records, 2);
    assert_eq!(result.total.pages, 1);
}

#[test]
fn test_typesense_config_without_nodes_fails_to_build() {
    let config: AdapterConfig = serde_json::from_value(json!({
        "adapter": "typesense",
        "collection": "products",
        "nodes": [],
        "api_key": "xyz",
        "query_by": ["title"]
    }))
    .unwrap();
    assert!(matches!(Index::from_config(&config), Err(UnsearchError::Config(_))));
}

const ENV_KEYS: [&str; 8] = [
    "UNSEARCH_ADAPTER",
    "UNSEARCH_INDEX",
    "UNSEARCH_PAGE_SIZE",
    "UNSEARCH_HOST",
    "UNSEARCH_APP_ID",
    "UNSEARCH_API_KEY",
    "UNSEARCH_NODES",
    "UNSEARCH_QUERY_BY",
];

fn reset_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_defaults_to_memory() {
    reset_env();
    assert_eq!(
        AdapterConfig::from_env().unwrap(),
        AdapterConfig::Memory(MemoryConfig::default())
    );
}

#[test]
#[serial]
fn test_from_env_typesense() {
    reset_env();
    std::env::set_var("UNSEARCH_ADAPTER", "typesense");
    std::env::set_var("UNSEARCH_INDEX", "products");
    std::env::set_var("UNSEARCH_NODES", "http://a:8108, http://b:8108");
    std::env::set_var("UNSEARCH_API_KEY", "xyz");
    std::env::set_var("UNSEARCH_QUERY_BY", "title,tags");
    std::env::set_var("UNSEARCH_PAGE_SIZE", "20");

    match AdapterConfig::from_env().unwrap() {
        AdapterConfig::Typesense(c) => {
            assert_eq!(c.collection, "products");
            assert_eq!(c.nodes, vec!["http://a:8108", "http://b:8108"]);
            assert_eq!(c.query_by, vec!["title", "tags"]);
            assert_eq!(c.page_size, 20);
        }
        other => panic!("unexpected config {:?}", other),
    }
    reset_env();
}

#[test]
#[serial]
fn test_from_env_reports_missing_settings() {
    reset_env();
    std::env::set_var("UNSEARCH_ADAPTER", "algolia");
    std::env::set_var("UNSEARCH_INDEX", "products");
    assert!(matches!(AdapterConfig::from_env(), Err(UnsearchError::Config(_))));

    std::env::set_var("UNSEARCH_ADAPTER", "solr");
    assert!(matches!(AdapterConfig::from_env(), Err(UnsearchError::Config(_))));

    std::env::set_var("UNSEARCH_ADAPTER", "memory");
    std::env::set_var("UNSEARCH_PAGE_SIZE", "ten");
    assert!(matches!(AdapterConfig::from_env(), Err(UnsearchError::Config(_))));
    reset_env();
}
