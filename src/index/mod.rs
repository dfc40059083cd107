use crate::adapters::{Adapter, Memory};
use crate::config::AdapterConfig;
use crate::error::{Result, UnsearchError};
use crate::query::{normalize_facets, normalize_sort};
use crate::types::{Document, SearchOptions, SearchResult, SoftPage, SoftSearchOptions};
use std::sync::Arc;

/// A search index over any [`Adapter`].
///
/// `Index` owns no documents. It normalizes caller input (page, sort,
/// facets, filters) into canonical [`SearchOptions`], rejecting malformed
/// input before the adapter is called, and otherwise forwards each call.
///
/// ```rust,no_run
/// use unsearch::{Document, Index, SoftSearchOptions};
/// use unsearch::query::filter::gte;
/// use serde_json::json;
///
/// # async fn run() -> unsearch::Result<()> {
/// let index = Index::memory();
/// index
///     .submit([Document::from_json(json!({"id": "1", "title": "Shirt", "price": 20}))?])
///     .await?;
///
/// let result = index
///     .search("shirt", SoftSearchOptions::new().sort("price").filters(gte("price", 10)))
///     .await?;
/// assert_eq!(result.total.records, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Index {
    adapter: Arc<dyn Adapter>,
}

impl Index {
    pub fn new(adapter: impl Adapter + 'static) -> Self {
        Index {
            adapter: Arc::new(adapter),
        }
    }

    pub fn with_adapter(adapter: Arc<dyn Adapter>) -> Self {
        Index { adapter }
    }

    /// An index over an empty [`Memory`] adapter with default settings.
    pub fn memory() -> Self {
        Index::new(Memory::default())
    }

    pub fn from_config(config: &AdapterConfig) -> Result<Self> {
        Ok(Index::with_adapter(config.build()?))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        self.adapter.get(id).await
    }

    /// Upsert documents. An empty batch returns without calling the adapter.
    pub async fn submit(&self, documents: impl IntoIterator<Item = Document>) -> Result<()> {
        let documents: Vec<Document> = documents.into_iter().collect();
        if documents.is_empty() {
            tracing::debug!("[INDEX] submit called with no documents, skipping");
            return Ok(());
        }
        tracing::debug!("[INDEX] submitting {} documents", documents.len());
        self.adapter.submit(documents).await
    }

    pub async fn search(&self, query: &str, options: SoftSearchOptions) -> Result<SearchResult> {
        let echo = options.filters.clone();
        let normalized = normalize_options(options)?;
        let mut result = self.adapter.search(query, normalized).await?;
        result.filters = echo;
        Ok(result)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(id).await
    }

    pub async fn swap(&self, new_index: &str) -> Result<()> {
        self.adapter.swap(new_index).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.adapter.clear().await
    }
}

/// Resolve loose caller options into the canonical form adapters receive.
pub fn normalize_options(options: SoftSearchOptions) -> Result<SearchOptions> {
    let filters = match &options.filters {
        Some(input) => Some(input.resolve()?),
        None => None,
    };
    Ok(SearchOptions {
        page: parse_page(options.page.as_ref())?,
        sort: normalize_sort(options.sort.as_ref()),
        facets: normalize_facets(options.facets.as_ref()),
        filters,
    })
}

fn parse_page(page: Option<&SoftPage>) -> Result<usize> {
    match page {
        None => Ok(0),
        Some(SoftPage::Number(n)) => usize::try_from(*n)
            .map_err(|_| UnsearchError::InvalidOptions(format!("page must not be negative, got {}", n))),
        Some(SoftPage::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<usize>()
                .map_err(|_| UnsearchError::InvalidOptions(format!("page must be a non-negative integer, got '{}'", s)))
        }
    }
}
