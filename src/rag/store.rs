//! Abstract interface for similarity-search backends.
//!
//! Implementations own the embedding step: callers hand over documents and
//! query strings, never raw vectors.

use async_trait::async_trait;

use super::document::{Document, ScoredDocument};
use crate::core::errors::RagError;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and index documents. Returns the generated entry ids in input order.
    async fn add_documents(&self, documents: Vec<Document>) -> Result<Vec<String>, RagError>;

    /// The `k` entries most similar to `query`, best first, with scores.
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RagError>;

    /// The `k` entries most similar to `query`, best first.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>, RagError> {
        let scored = self.similarity_search_with_score(query, k).await?;
        Ok(scored.into_iter().map(|hit| hit.document).collect())
    }

    /// Number of indexed entries.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
