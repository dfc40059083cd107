//! Storage backends behind the [`Index`](crate::Index) facade.
//!
//! Every adapter receives canonical [`SearchOptions`] (0-based page,
//! resolved sort and facets, one validated filter tree) and answers with a
//! canonical [`SearchResult`]. Backend quirks such as 1-based pages, id
//! escaping or `objectID` renaming stay inside the adapter.

use crate::error::Result;
use crate::types::{Document, SearchOptions, SearchResult};
use async_trait::async_trait;

pub mod algolia;
mod http;
pub mod meilisearch;
pub mod memory;
pub mod typesense;

pub use algolia::Algolia;
pub use meilisearch::MeiliSearch;
pub use memory::Memory;
pub use typesense::Typesense;

#[async_trait]
pub trait Adapter: Send + Sync {
    /// Fetch one document; `Ok(None)` when the id is unknown.
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResult>;

    /// Upsert: documents whose id already exists are replaced.
    async fn submit(&self, documents: Vec<Document>) -> Result<()>;

    /// Remove one document. Unknown ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Atomically exchange the live index with `new_index`.
    async fn swap(&self, new_index: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
