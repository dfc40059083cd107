use super::Adapter;
use crate::config::MemoryConfig;
use crate::error::Result;
use crate::query::{FuzzyMatcher, QueryExecutor};
use crate::types::{Document, SearchOptions, SearchResult};
use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Process-local adapter backed by an id → document table.
///
/// Mutations take the write lock, so each `submit`/`delete`/`clear` is
/// atomic with respect to concurrent searches.
pub struct Memory {
    documents: RwLock<IndexMap<String, Document>>,
    executor: QueryExecutor,
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new(MemoryConfig::default())
    }
}

impl Memory {
    pub fn new(config: MemoryConfig) -> Self {
        let matcher = FuzzyMatcher::new(
            config.keys,
            config.min_word_size_for_1_typo,
            config.min_word_size_for_2_typos,
        );
        Memory {
            documents: RwLock::new(IndexMap::new()),
            executor: QueryExecutor::new(matcher, config.page_size),
        }
    }

    /// Seed the table. Later duplicates of an id replace earlier ones.
    pub fn with_documents(config: MemoryConfig, documents: impl IntoIterator<Item = Document>) -> Self {
        let memory = Memory::new(config);
        let table = documents
            .into_iter()
            .map(|doc| (doc.id().to_string(), doc))
            .collect();
        Memory {
            documents: RwLock::new(table),
            ..memory
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl Adapter for Memory {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResult> {
        let documents = self.documents.read().await;
        self.executor.execute(documents.values(), query, options)
    }

    async fn submit(&self, documents: Vec<Document>) -> Result<()> {
        let mut table = self.documents.write().await;
        for doc in documents {
            table.insert(doc.id().to_string(), doc);
        }
        tracing::debug!("[MEMORY] {} documents stored", table.len());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.documents.write().await.shift_remove(id);
        Ok(())
    }

    async fn swap(&self, new_index: &str) -> Result<()> {
        tracing::debug!("[MEMORY] swap to '{}' ignored, no secondary index", new_index);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.documents.write().await.clear();
        Ok(())
    }
}
