//! Adapter configuration, deserializable from JSON/TOML or loaded from the
//! environment.

use crate::adapters::{Adapter, Algolia, MeiliSearch, Memory, Typesense};
use crate::error::{Result, UnsearchError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_page_size() -> usize {
    10
}

fn default_min_word_size_for_1_typo() -> usize {
    4
}

fn default_min_word_size_for_2_typos() -> usize {
    8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Searchable fields. Empty means every top-level field.
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default = "default_min_word_size_for_1_typo")]
    pub min_word_size_for_1_typo: usize,
    #[serde(default = "default_min_word_size_for_2_typos")]
    pub min_word_size_for_2_typos: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            page_size: default_page_size(),
            keys: Vec::new(),
            min_word_size_for_1_typo: default_min_word_size_for_1_typo(),
            min_word_size_for_2_typos: default_min_word_size_for_2_typos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoliaConfig {
    pub index: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub app_id: String,
    pub api_key: String,
    /// Base URL override; defaults to `https://{app_id}-dsn.algolia.net`.
    #[serde(default)]
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeiliSearchConfig {
    pub index: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub host: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypesenseConfig {
    pub collection: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Node base URLs; requests go to the first one.
    pub nodes: Vec<String>,
    pub api_key: String,
    pub query_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adapter", rename_all = "lowercase")]
pub enum AdapterConfig {
    Memory(MemoryConfig),
    Algolia(AlgoliaConfig),
    MeiliSearch(MeiliSearchConfig),
    Typesense(TypesenseConfig),
}

impl AdapterConfig {
    pub fn build(&self) -> Result<Arc<dyn Adapter>> {
        let adapter: Arc<dyn Adapter> = match self {
            AdapterConfig::Memory(c) => Arc::new(Memory::new(c.clone())),
            AdapterConfig::Algolia(c) => Arc::new(Algolia::new(c.clone())),
            AdapterConfig::MeiliSearch(c) => Arc::new(MeiliSearch::new(c.clone())),
            AdapterConfig::Typesense(c) => Arc::new(Typesense::new(c.clone())?),
        };
        Ok(adapter)
    }

    /// Load from `UNSEARCH_*` environment variables. `UNSEARCH_ADAPTER`
    /// defaults to `memory`.
    pub fn from_env() -> Result<Self> {
        let adapter = env("UNSEARCH_ADAPTER").unwrap_or_else(|| "memory".to_string());
        let page_size = match env("UNSEARCH_PAGE_SIZE") {
            Some(v) => v.parse().map_err(|_| {
                UnsearchError::Config(format!("UNSEARCH_PAGE_SIZE must be a positive integer, got '{}'", v))
            })?,
            None => default_page_size(),
        };
        let query_by = env("UNSEARCH_QUERY_BY").map(|v| split_list(&v)).unwrap_or_default();

        let config = match adapter.to_ascii_lowercase().as_str() {
            "memory" => AdapterConfig::Memory(MemoryConfig {
                page_size,
                keys: query_by,
                ..MemoryConfig::default()
            }),
            "algolia" => AdapterConfig::Algolia(AlgoliaConfig {
                index: required("UNSEARCH_INDEX")?,
                page_size,
                app_id: required("UNSEARCH_APP_ID")?,
                api_key: required("UNSEARCH_API_KEY")?,
                host: env("UNSEARCH_HOST"),
            }),
            "meilisearch" => AdapterConfig::MeiliSearch(MeiliSearchConfig {
                index: required("UNSEARCH_INDEX")?,
                page_size,
                host: required("UNSEARCH_HOST")?,
                api_key: env("UNSEARCH_API_KEY").unwrap_or_default(),
            }),
            "typesense" => AdapterConfig::Typesense(TypesenseConfig {
                collection: required("UNSEARCH_INDEX")?,
                page_size,
                nodes: split_list(&required("UNSEARCH_NODES")?),
                api_key: required("UNSEARCH_API_KEY")?,
                query_by,
            }),
            other => {
                return Err(UnsearchError::Config(format!("Unknown adapter '{}'", other)));
            }
        };
        tracing::debug!("[CONFIG] Loaded {} adapter config from environment", adapter);
        Ok(config)
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn required(name: &str) -> Result<String> {
    env(name).ok_or_else(|| UnsearchError::Config(format!("{} is not set", name)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_defaults() {
        let config: AdapterConfig = serde_json::from_value(json!({"adapter": "memory"})).unwrap();
        assert_eq!(config, AdapterConfig::Memory(MemoryConfig::default()));
    }

    #[test]
    fn test_tagged_hosted_config() {
        let config: AdapterConfig = serde_json::from_value(json!({
            "adapter": "typesense",
            "collection": "products",
            "nodes": ["http://localhost:8108"],
            "api_key": "xyz",
            "query_by": ["title"],
            "page_size": 25
        }))
        .unwrap();
        match config {
            AdapterConfig::Typesense(c) => {
                assert_eq!(c.page_size, 25);
                assert_eq!(c.nodes, vec!["http://localhost:8108"]);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_unknown_adapter_tag_is_rejected() {
        assert!(serde_json::from_value::<AdapterConfig>(json!({"adapter": "solr"})).is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b,,c "), vec!["a", "b", "c"]);
    }
}
