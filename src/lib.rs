//! # Unsearch
//!
//! One search API over several engines. An [`Index`] forwards every call to
//! an [`Adapter`](adapters::Adapter): the in-process [`Memory`] engine, or
//! the hosted [`Algolia`], [`MeiliSearch`] and [`Typesense`] services.
//!
//! Filters are written once as a [`Filter`] tree and compiled into each
//! engine's own filter syntax, or evaluated natively by the memory engine.
//! Results come back in one shape ([`SearchResult`]) whatever the backend.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use unsearch::query::filter::{and, eq, gte};
//! use unsearch::{Document, Index, SoftSearchOptions};
//! use serde_json::json;
//!
//! # async fn run() -> unsearch::Result<()> {
//! let index = Index::memory();
//! index
//!     .submit([
//!         Document::from_json(json!({"id": "1", "title": "Red Shirt", "price": 25, "tags": ["sale"]}))?,
//!         Document::from_json(json!({"id": "2", "title": "Blue Pants", "price": 40}))?,
//!     ])
//!     .await?;
//!
//! let result = index
//!     .search(
//!         "shirt",
//!         SoftSearchOptions::new()
//!             .facets("tags")
//!             .filters(and([eq("title", "Red Shirt"), gte("price", 10)])),
//!     )
//!     .await?;
//! println!("{} hits", result.total.records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`AdapterConfig`] deserializes from any serde format (tagged by
//! `"adapter"`) or loads from `UNSEARCH_*` environment variables, and builds
//! an [`Index`] with [`Index::from_config`].
//!
//! Logging goes through `tracing`; install any subscriber to see it.

pub mod adapters;
pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod types;

pub use adapters::{Adapter, Algolia, MeiliSearch, Memory, Typesense};
pub use config::{AdapterConfig, AlgoliaConfig, MeiliSearchConfig, MemoryConfig, TypesenseConfig};
pub use error::{Result, UnsearchError};
pub use index::Index;
pub use query::{Filter, FilterInput};
pub use types::*;
