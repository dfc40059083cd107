use super::http::{segment, RestClient};
use super::Adapter;
use crate::config::TypesenseConfig;
use crate::error::{Result, UnsearchError};
use crate::query::sort::sort_strings;
use crate::query::{CompiledFilter, FilterCompiler, FilterInput, TypesenseDialect};
use crate::types::{Document, FacetStats, SearchOptions, SearchResult, Total};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const BACKEND: &str = "Typesense";

/// Typesense REST adapter. Requests go to the first configured node.
pub struct Typesense {
    collection: String,
    page_size: usize,
    query_by: String,
    client: RestClient,
    compiler: FilterCompiler<TypesenseDialect>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    found: usize,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    hits: Vec<Hit>,
    #[serde(default)]
    facet_counts: Vec<FacetCounts>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    document: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FacetCounts {
    field_name: String,
    #[serde(default)]
    counts: Vec<FacetCount>,
}

#[derive(Debug, Deserialize)]
struct FacetCount {
    value: String,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ImportLine {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl Typesense {
    pub fn new(config: TypesenseConfig) -> Result<Self> {
        let node = config
            .nodes
            .first()
            .ok_or_else(|| UnsearchError::Config("Typesense needs at least one node".to_string()))?;
        if config.query_by.is_empty() {
            return Err(UnsearchError::Config(
                "Typesense needs at least one query_by field".to_string(),
            ));
        }
        Ok(Typesense {
            client: RestClient::new(BACKEND, node, vec![("x-typesense-api-key", config.api_key.clone())]),
            collection: config.collection,
            page_size: config.page_size.max(1),
            query_by: config.query_by.join(","),
            compiler: FilterCompiler::default(),
        })
    }

    fn documents_path(&self) -> String {
        format!("/collections/{}/documents", segment(&self.collection))
    }

    fn document_path(&self, id: &str) -> String {
        format!("{}/{}", self.documents_path(), segment(id))
    }
}

fn fold_facets(facet_counts: Vec<FacetCounts>) -> BTreeMap<String, FacetStats> {
    facet_counts
        .into_iter()
        .map(|facet| {
            let stats = facet.counts.into_iter().map(|c| (c.value, c.count)).collect();
            (facet.field_name, stats)
        })
        .collect()
}

/// Import answers one JSON line per document; surface the first failure.
fn check_import(body: &str) -> Result<()> {
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let line: ImportLine = serde_json::from_str(line)?;
        if !line.success {
            return Err(UnsearchError::Rejected {
                backend: BACKEND,
                message: line.error.unwrap_or_else(|| "import failed".to_string()),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl Adapter for Typesense {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        match self.client.get(&self.document_path(id)).await? {
            Some(Value::Object(doc)) => Ok(Some(Document::try_from(doc)?)),
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

        let q = if query.trim().is_empty() { "*" } else { query };
        let mut params = vec![
            ("q", q.to_string()),
            ("query_by", self.query_by.clone()),
            ("page", options.page.saturating_add(1).to_string()),
            ("per_page", self.page_size.to_string()),
        ];
        if !options.sort.is_empty() {
            params.push(("sort_by", sort_strings(&options.sort).join(",")));
        }
        if !options.facets.is_empty() {
            params.push(("facet_by", options.facets.join(",")));
        }
        if let CompiledFilter::Expr(filter) = &compiled {
            params.push(("filter_by", filter.clone()));
        }

        let response = self
            .client
            .get_query(&format!("{}/search", self.documents_path()), &params)
            .await?;
        let response: SearchResponse = serde_json::from_value(response)?;

        let records = response
            .hits
            .into_iter()
            .map(|hit| Document::try_from(hit.document))
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchResult {
            query: query.to_string(),
            page: response.page.map_or(options.page, |p| p.saturating_sub(1)),
            total: Total::new(response.found, self.page_size),
            sort: options.sort,
            records,
            facets: fold_facets(response.facet_counts),
            filters: options.filters.map(FilterInput::from),
        })
    }

    async fn submit(&self, documents: Vec<Document>) -> Result<()> {
        let mut body = String::new();
        for doc in &documents {
            body.push_str(&serde_json::to_string(doc)?);
            body.push('\n');
        }
        let response = self
            .client
            .post_text(&format!("{}/import?action=upsert", self.documents_path()), body)
            .await?;
        check_import(&response)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&self.document_path(id)).await
    }

    /// Point the alias named after this collection at `new_collection`.
    async fn swap(&self, new_collection: &str) -> Result<()> {
        self.client
            .put(
                &format!("/aliases/{}", segment(&self.collection)),
                &json!({ "collection_name": new_collection }),
            )
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.client
            .delete(&format!("{}?truncate=true", self.documents_path()))
            .await
    }
}
