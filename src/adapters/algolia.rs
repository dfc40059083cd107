use super::http::{segment, RestClient};
use super::Adapter;
use crate::config::AlgoliaConfig;
use crate::error::{Result, UnsearchError};
use crate::query::{AlgoliaDialect, CompiledFilter, FilterCompiler, FilterInput};
use crate::types::{Document, FacetStats, SearchOptions, SearchResult, Total};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const BACKEND: &str = "Algolia";

fn algolia_host(app_id: &str) -> String {
    format!("https://{}-dsn.algolia.net", app_id)
}

fn algolia_headers(app_id: &str, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("x-algolia-application-id", app_id.to_string()),
        ("x-algolia-api-key", api_key.to_string()),
    ]
}

/// Algolia REST adapter. Documents are stored with `objectID` set to the
/// document id.
///
/// Algolia sorts through replica indices only, so query-time sort keys are
/// dropped (with a warning) and the result echoes an empty sort.
pub struct Algolia {
    index: String,
    page_size: usize,
    client: RestClient,
    compiler: FilterCompiler<AlgoliaDialect>,
}

#[derive(Debug, Default, Deserialize)]
struct QueriesResponse {
    #[serde(default)]
    results: Vec<QueryResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<Map<String, Value>>,
    #[serde(default)]
    nb_hits: usize,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    facets: BTreeMap<String, FacetStats>,
}

impl Algolia {
    pub fn new(config: AlgoliaConfig) -> Self {
        let host = config
            .host
            .clone()
            .unwrap_or_else(|| algolia_host(&config.app_id));
        Algolia {
            client: RestClient::new(BACKEND, &host, algolia_headers(&config.app_id, &config.api_key)),
            index: config.index,
            page_size: config.page_size.max(1),
            compiler: FilterCompiler::default(),
        }
    }

    fn index_path(&self) -> String {
        format!("/1/indexes/{}", segment(&self.index))
    }

    fn object_path(&self, id: &str) -> String {
        format!("{}/{}", self.index_path(), segment(id))
    }
}

fn serialize(doc: Document) -> Value {
    let id = doc.id().to_string();
    let mut fields = doc.into_fields();
    fields.insert("objectID".to_string(), Value::String(id));
    Value::Object(fields)
}

/// Per-hit metadata Algolia adds to search responses.
const HIT_METADATA: [&str; 4] = [
    "_highlightResult",
    "_snippetResult",
    "_rankingInfo",
    "_distinctSeqID",
];

/// Restore `id` from `objectID` and drop Algolia's hit metadata.
fn deserialize(mut hit: Map<String, Value>) -> Result<Document> {
    if let Some(object_id) = hit.remove("objectID") {
        hit.insert("id".to_string(), object_id);
    }
    for key in HIT_METADATA {
        hit.remove(key);
    }
    Document::try_from(hit)
}

#[async_trait]
impl Adapter for Algolia {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        match self.client.get(&self.object_path(id)).await? {
            Some(Value::Object(hit)) => Ok(Some(deserialize(hit)?)),
            Some(other) => Err(UnsearchError::InvalidDocument(format!(
                "{} returned a non-object document: {}",
                BACKEND, other
            ))),
            None => Ok(None),
        }
    }

    async fn search(&self, query: &str, mut options: SearchOptions) -> Result<SearchResult> {
        if !options.sort.is_empty() {
            tracing::warn!(
                "[ALGOLIA] Query-time sort is not supported, ignoring {} sort keys",
                options.sort.len()
            );
            options.sort.clear();
        }

        let compiled = self.compiler.compile(options.filters.as_ref())?;
        if compiled.is_match_none() {
            return Ok(SearchResult::empty(query, options));
        }

        let mut request = json!({
            "indexName": self.index,
            "query": query,
            "page": options.page,
            "hitsPerPage": self.page_size,
        });
        if !options.facets.is_empty() {
            request["facets"] = json!(options.facets);
        }
        if let CompiledFilter::Expr(filters) = &compiled {
            request["filters"] = json!(filters);
        }

        let response = self
            .client
            .post("/1/indexes/*/queries", &json!({ "requests": [request] }))
            .await?;
        let response: QueriesResponse = serde_json::from_value(response)?;
        let result = response.results.into_iter().next().unwrap_or_default();

        let records = result
            .hits
            .into_iter()
            .map(deserialize)
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchResult {
            query: query.to_string(),
            page: result.page.unwrap_or(options.page),
            total: Total::new(result.nb_hits, self.page_size),
            sort: options.sort,
            records,
            facets: result.facets,
            filters: options.filters.map(FilterInput::from),
        })
    }

    async fn submit(&self, documents: Vec<Document>) -> Result<()> {
        let requests: Vec<Value> = documents
            .into_iter()
            .map(|doc| json!({ "action": "updateObject", "body": serialize(doc) }))
            .collect();
        self.client
            .post(&format!("{}/batch", self.index_path()), &json!({ "requests": requests }))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&self.object_path(id)).await
    }

    async fn swap(&self, new_index: &str) -> Result<()> {
        self.client
            .post(
                &format!("{}/operation", self.index_path()),
                &json!({
                    "operation": "move",
                    "destination": new_index,
                    "scope": ["rules", "settings"],
                }),
            )
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.client
            .post(&format!("{}/clear", self.index_path()), &json!({}))
            .await?;
        Ok(())
    }
}
