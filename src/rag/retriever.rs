use std::sync::Arc;

use async_trait::async_trait;

use super::document::Document;
use super::store::VectorStore;
use crate::core::errors::RagError;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Documents relevant to `query`, best first. An empty result is not an error.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RagError>;
}

/// Top-`k` similarity search over a vector store.
#[derive(Clone)]
pub struct VectorStoreRetriever {
    store: Arc<dyn VectorStore>,
    k: usize,
}

impl VectorStoreRetriever {
    pub fn new(store: Arc<dyn VectorStore>, k: usize) -> Self {
        Self { store, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RagError> {
        tracing::debug!("retrieving k={} for query: {}", self.k, query);
        self.store.similarity_search(query, self.k).await
    }
}
