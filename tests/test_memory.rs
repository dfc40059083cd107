mod common;

use common::{catalog, doc, ids, init_tracing, memory_index, numbered};
use serde_json::json;
use unsearch::query::filter::{and, eq, gte, lt, neq, not, one_of, or};
use unsearch::{Index, Memory, MemoryConfig, SoftSearchOptions, SortField, Total};

fn paged_index(count: usize, page_size: usize) -> Index {
    Index::new(Memory::with_documents(
        MemoryConfig {
            page_size,
            ..MemoryConfig::default()
        },
        numbered(count),
    ))
}

#[tokio::test]
async fn test_pagination_over_38_documents() {
    init_tracing();
    let index = paged_index(38, 5);

    let first = index.search("", SoftSearchOptions::new().page(0usize)).await.unwrap();
    assert_eq!(first.records.len(), 5);
    assert_eq!(first.total, Total { pages: 8, records: 38 });
    assert_eq!(first.page, 0);

    let last = index.search("", SoftSearchOptions::new().page(7usize)).await.unwrap();
    assert_eq!(ids(&last.records), vec!["doc-35", "doc-36", "doc-37"]);

    let beyond = index.search("", SoftSearchOptions::new().page(99usize)).await.unwrap();
    assert!(beyond.records.is_empty());
    assert_eq!(beyond.total, Total { pages: 8, records: 38 });
}

#[tokio::test]
async fn test_string_page_is_accepted() {
    let index = paged_index(12, 5);
    let result = index.search("", SoftSearchOptions::new().page("2")).await.unwrap();
    assert_eq!(result.page, 2);
    assert_eq!(result.records.len(), 2);
}

#[tokio::test]
async fn test_default_page_size_is_ten() {
    let index = Index::new(Memory::with_documents(MemoryConfig::default(), numbered(25)));
    let result = index.search("", SoftSearchOptions::new()).await.unwrap();
    assert_eq!(result.records.len(), 10);
    assert_eq!(result.total.pages, 3);
}

#[tokio::test]
async fn test_fuzzy_query_tolerates_typos() {
    let index = memory_index(10);

    let result = index.search("shirt", SoftSearchOptions::new()).await.unwrap();
    assert_eq!(ids(&result.records), vec!["shirt-red", "shirt-blue"]);

    let result = index.search("shrit", SoftSearchOptions::new()).await.unwrap();
    assert_eq!(ids(&result.records), vec!["shirt-red", "shirt-blue"]);

    let result = index.search("zzzzzz", SoftSearchOptions::new()).await.unwrap();
    assert!(result.records.is_empty());
    assert_eq!(result.total, Total { pages: 0, records: 0 });
}

#[tokio::test]
async fn test_query_only_searches_configured_keys() {
    let index = memory_index(10);
    // `category` is not a searchable key
    let result = index.search("accessories", SoftSearchOptions::new()).await.unwrap();
    assert!(result.records.is_empty());
}

#[tokio::test]
async fn test_filters_apply_to_text_matches() {
    let index = memory_index(10);
    let result = index
        .search("shirt", SoftSearchOptions::new().filters(gte("price", 30)))
        .await
        .unwrap();
    assert_eq!(ids(&result.records), vec!["shirt-blue"]);
    assert_eq!(result.filters, Some(gte("price", 30).into()));
}

#[tokio::test]
async fn test_filter_combinations() {
    let index = memory_index(10);

    let result = index
        .search(
            "",
            SoftSearchOptions::new().filters(or([
                eq("category", "accessories"),
                and([eq("category", "clothing"), lt("price", 10)]),
            ])),
        )
        .await
        .unwrap();
    assert_eq!(ids(&result.records), vec!["socks", "hat", "products/scarf"]);

    let result = index
        .search("", SoftSearchOptions::new().filters(not(one_of("category", ["shirts", "clothing"]))))
        .await
        .unwrap();
    assert_eq!(ids(&result.records), vec!["hat", "products/scarf"]);

    // absent `price` passes `!=`
    let result = index
        .search("", SoftSearchOptions::new().filters(neq("price", 25)))
        .await
        .unwrap();
    assert_eq!(result.total.records, 5);
}

#[tokio::test]
async fn test_list_filter_is_implicit_and() {
    let index = memory_index(10);
    let result = index
        .search(
            "",
            SoftSearchOptions::new().filters(vec![eq("category", "shirts"), lt("price", 30)]),
        )
        .await
        .unwrap();
    assert_eq!(ids(&result.records), vec!["shirt-red"]);
}

#[tokio::test]
async fn test_mapping_filter_form() {
    let index = memory_index(10);
    let filters = unsearch::FilterInput::from_json(json!({
        "category": {"eq": "clothing"},
        "price": {"gte": 5, "lt": 40}
    }))
    .unwrap();
    let result = index.search("", SoftSearchOptions::new().filters(filters)).await.unwrap();
    assert_eq!(ids(&result.records), vec!["socks"]);
}

#[tokio::test]
async fn test_empty_or_matches_nothing_and_empty_and_everything() {
    let index = memory_index(10);
    let none = index.search("", SoftSearchOptions::new().filters(or([]))).await.unwrap();
    assert!(none.records.is_empty());
    let all = index.search("", SoftSearchOptions::new().filters(and([]))).await.unwrap();
    assert_eq!(all.total.records, 6);
}

#[tokio::test]
async fn test_sort_is_stable_and_missing_values_last() {
    let index = memory_index(10);

    let result = index
        .search("", SoftSearchOptions::new().sort("category"))
        .await
        .unwrap();
    assert_eq!(
        ids(&result.records),
        vec!["hat", "products/scarf", "pants", "socks", "shirt-red", "shirt-blue"]
    );
    assert_eq!(result.sort, vec![SortField::asc("category")]);

    let result = index
        .search("", SoftSearchOptions::new().sort(vec![SortField::desc("price")]))
        .await
        .unwrap();
    assert_eq!(
        ids(&result.records),
        vec!["products/scarf", "pants", "shirt-blue", "shirt-red", "socks", "hat"]
    );
}

#[tokio::test]
async fn test_multi_key_sort() {
    let index = memory_index(10);
    let result = index
        .search(
            "",
            SoftSearchOptions::new().sort(vec![SortField::asc("category"), SortField::desc("price")]),
        )
        .await
        .unwrap();
    assert_eq!(
        ids(&result.records),
        vec!["products/scarf", "hat", "pants", "socks", "shirt-blue", "shirt-red"]
    );
}

#[tokio::test]
async fn test_facets_count_array_elements_over_filtered_set() {
    let index = memory_index(2);
    let result = index
        .search(
            "",
            SoftSearchOptions::new()
                .facets(vec!["tags", "category"])
                .filters(neq("category", "accessories")),
        )
        .await
        .unwrap();

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.total.records, 4);
    assert_eq!(result.facets["tags"]["sale"], 2);
    assert_eq!(result.facets["tags"]["summer"], 2);
    assert_eq!(result.facets["tags"]["fall"], 2);
    assert_eq!(result.facets["category"]["shirts"], 2);
    assert_eq!(result.facets["category"]["clothing"], 2);
    assert!(!result.facets["category"].contains_key("accessories"));
}

#[tokio::test]
async fn test_lifecycle() {
    let index = Index::new(Memory::default());
    index.submit(catalog()).await.unwrap();

    let scarf = index.get("products/scarf").await.unwrap().unwrap();
    assert_eq!(scarf.get("price"), Some(&json!(60)));

    index
        .submit([doc(json!({"id": "products/scarf", "title": "Silk Scarf", "price": 55}))])
        .await
        .unwrap();
    let scarf = index.get("products/scarf").await.unwrap().unwrap();
    assert_eq!(scarf.get("price"), Some(&json!(55)));
    assert_eq!(scarf.get("category"), None);

    index.delete("products/scarf").await.unwrap();
    assert!(index.get("products/scarf").await.unwrap().is_none());
    index.delete("products/scarf").await.unwrap();

    index.swap("products_v2").await.unwrap();
    assert_eq!(index.search("", SoftSearchOptions::new()).await.unwrap().total.records, 5);

    index.clear().await.unwrap();
    assert_eq!(index.search("", SoftSearchOptions::new()).await.unwrap().total.records, 0);
}
