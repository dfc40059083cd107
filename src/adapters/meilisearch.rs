use super::http::{segment, RestClient};
use super::Adapter;
use crate::config::MeiliSearchConfig;
use crate::error::{Result, UnsearchError};
use crate::query::sort::sort_strings;
use crate::query::{CompiledFilter, FilterCompiler, FilterInput, MeiliDialect};
use crate::types::{Document, FacetStats, SearchOptions, SearchResult, Total};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const BACKEND: &str = "MeiliSearch";

/// MeiliSearch REST adapter.
///
/// Meili document ids only allow `[A-Za-z0-9_-]`, so ids are escaped on the
/// way in and unescaped on the way out. Write calls return as soon as Meili
/// has enqueued the task.
pub struct MeiliSearch {
    index: String,
    page_size: usize,
    client: RestClient,
    compiler: FilterCompiler<MeiliDialect>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Map<String, Value>>,
    #[serde(default)]
    total_hits: usize,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    facet_distribution: BTreeMap<String, FacetStats>,
}

/// Escape `-` as `-_` and `/` as `--`.
pub fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        match c {
            '-' => out.push_str("-_"),
            '/' => out.push_str("--"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_id`]. A dangling `-` is kept as is.
pub fn unescape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut chars = id.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '-' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('_') => {
                chars.next();
                out.push('-');
            }
            Some('-') => {
                chars.next();
                out.push('/');
            }
            _ => out.push('-'),
        }
    }
    out
}

fn deserialize(hit: Map<String, Value>) -> Result<Document> {
    Ok(Document::try_from(hit)?.map_id(unescape_id))
}

impl MeiliSearch {
    pub fn new(config: MeiliSearchConfig) -> Self {
        let mut headers = Vec::new();
        if !config.api_key.is_empty() {
            headers.push(("authorization", format!("Bearer {}", config.api_key)));
        }
        MeiliSearch {
            client: RestClient::new(BACKEND, &config.host, headers),
            index: config.index,
            page_size: config.page_size.max(1),
            compiler: FilterCompiler::default(),
        }
    }

    fn documents_path(&self) -> String {
        format!("/indexes/{}/documents", segment(&self.index))
    }

    fn document_path(&self, id: &str) -> String {
        format!("{}/{}", self.documents_path(), segment(&escape_id(id)))
    }
}

#[async_trait]
impl Adapter for MeiliSearch {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        match self.client.get(&self.document_path(id)).await? {
            Some(Value::Object(hit)) => Ok(Some(deserialize(hit)?)),
            Some(other) => Err(UnsearchError::InvalidDocument(format!(
                "{} returned a non-object document: {}",
                BACKEND, other
            ))),
            None => Ok(None),
        }
    }

    async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResult> {
        let compiled = self.compiler.compile(options.filters.as_ref())?;
        if compiled.is_match_none() {
            return Ok(SearchResult::empty(query, options));
        }

        let mut body = json!({
            "q": query,
            "page": options.page.saturating_add(1),
            "hitsPerPage": self.page_size,
        });
        if !options.sort.is_empty() {
            body["sort"] = json!(sort_strings(&options.sort));
        }
        if !options.facets.is_empty() {
            body["facets"] = json!(options.facets);
        }
        if let CompiledFilter::Expr(filter) = &compiled {
            body["filter"] = json!(filter);
        }

        let response = self
            .client
            .post(&format!("/indexes/{}/search", segment(&self.index)), &body)
            .await?;
        let response: SearchResponse = serde_json::from_value(response)?;

        let records = response
            .hits
            .into_iter()
            .map(deserialize)
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchResult {
            query: query.to_string(),
            page: response.page.map_or(options.page, |p| p.saturating_sub(1)),
            total: Total::new(response.total_hits, self.page_size),
            sort: options.sort,
            records,
            facets: response.facet_distribution,
            filters: options.filters.map(FilterInput::from),
        })
    }

    async fn submit(&self, documents: Vec<Document>) -> Result<()> {
        let payload: Vec<Value> = documents
            .into_iter()
            .map(|doc| doc.map_id(escape_id).to_json())
            .collect();
        self.client
            .post(&format!("{}?primaryKey=id", self.documents_path()), &Value::Array(payload))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&self.document_path(id)).await
    }

    async fn swap(&self, new_index: &str) -> Result<()> {
        self.client
            .post("/swap-indexes", &json!([{ "indexes": [new_index, self.index] }]))
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.client.delete(&self.documents_path()).await
    }
}
