//! In-memory vector store.
//!
//! Keeps every `(document, embedding)` pair in a `Vec` and answers queries by
//! brute-force cosine similarity. Nothing is persisted; the index lives as
//! long as the store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::document::{Document, ScoredDocument};
use super::store::VectorStore;
use super::vector_math::rank_descending_by_cosine;
use crate::core::errors::RagError;
use crate::llm::EmbeddingModel;

#[derive(Debug, Clone)]
struct MemoryEntry {
    id: String,
    document: Document,
    embedding: Vec<f32>,
}

pub struct MemoryVectorStore {
    embeddings: Arc<dyn EmbeddingModel>,
    entries: RwLock<Vec<MemoryEntry>>,
}

impl MemoryVectorStore {
    pub fn new(embeddings: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embeddings,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Build a store and index `documents` in one step.
    pub async fn from_documents(
        documents: Vec<Document>,
        embeddings: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, RagError> {
        let store = Self::new(embeddings);
        store.add_documents(documents).await?;
        Ok(store)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_documents(&self, documents: Vec<Document>) -> Result<Vec<String>, RagError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents
            .iter()
            .map(|doc| doc.page_content.clone())
            .collect();
        let vectors = self.embeddings.embed_documents(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(RagError::Internal(format!(
                "Embedding count mismatch: {} documents, {} vectors",
                documents.len(),
                vectors.len()
            )));
        }

        let new_entries: Vec<MemoryEntry> = documents
            .into_iter()
            .zip(vectors)
            .map(|(document, embedding)| MemoryEntry {
                id: uuid::Uuid::new_v4().to_string(),
                document,
                embedding,
            })
            .collect();
        let ids = new_entries.iter().map(|entry| entry.id.clone()).collect();

        let mut entries = self.entries.write().await;
        entries.extend(new_entries);
        tracing::info!("Indexed {} document(s) into memory store", entries.len());

        Ok(ids)
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RagError> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query_embedding = self.embeddings.embed_query(query).await?;

        let entries = self.entries.read().await;
        let ranking = rank_descending_by_cosine(
            &query_embedding,
            entries.iter().map(|entry| entry.embedding.as_slice()),
        )?;

        let hits = ranking
            .into_iter()
            .take(k)
            .filter_map(|(idx, score)| {
                entries.get(idx).map(|entry| ScoredDocument {
                    id: entry.id.clone(),
                    document: entry.document.clone(),
                    score,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!("similarity search returned {} hit(s) for k={}", hits.len(), k);
        Ok(hits)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps text to a vector by keyword presence, so similarity is predictable.
    struct KeywordEmbeddings {
        calls: AtomicUsize,
    }

    const KEYWORDS: [&str; 3] = ["license", "author", "weather"];

    impl KeywordEmbeddings {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingModel for KeywordEmbeddings {
        async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    let mut vector: Vec<f32> = KEYWORDS
                        .iter()
                        .map(|kw| if lower.contains(kw) { 1.0 } else { 0.0 })
                        .collect();
                    vector.push(0.1);
                    vector
                })
                .collect())
        }
    }

    /// Returns a query vector one dimension longer than the indexed ones.
    struct DriftingEmbeddings;

    #[async_trait]
    impl EmbeddingModel for DriftingEmbeddings {
        async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        async fn embed_query(&self, _query: &str) -> Result<Vec<f32>, RagError> {
            Ok(vec![1.0, 0.0, 0.0])
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::from_source("LangChain is released under the MIT license.", "a"),
            Document::from_source("The author of the novel is Fuse.", "b"),
            Document::from_source("Tomorrow's weather is sunny.", "c"),
        ]
    }

    #[tokio::test]
    async fn empty_store_returns_no_results() {
        let embeddings = Arc::new(KeywordEmbeddings::new());
        let store = MemoryVectorStore::new(embeddings.clone());

        let hits = store.similarity_search("license?", 3).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(embeddings.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_ranks_most_similar_first() {
        let store = MemoryVectorStore::from_documents(docs(), Arc::new(KeywordEmbeddings::new()))
            .await
            .unwrap();

        let hits = store
            .similarity_search_with_score("what is the license", 2)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.source(), Some("a"));
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn k_larger_than_store_returns_everything() {
        let store = MemoryVectorStore::from_documents(docs(), Arc::new(KeywordEmbeddings::new()))
            .await
            .unwrap();

        let hits = store.similarity_search("author", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].source(), Some("b"));
    }

    #[tokio::test]
    async fn zero_k_returns_nothing() {
        let store = MemoryVectorStore::from_documents(docs(), Arc::new(KeywordEmbeddings::new()))
            .await
            .unwrap();
        assert!(store.similarity_search("author", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_documents_returns_one_unique_id_per_document() {
        let store = MemoryVectorStore::new(Arc::new(KeywordEmbeddings::new()));
        let ids = store.add_documents(docs()).await.unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(store.len().await, 3);
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 3);

        let hits = store
            .similarity_search_with_score("who is the author", 1)
            .await
            .unwrap();
        assert_eq!(hits[0].id, ids[1]);

        assert!(store.add_documents(Vec::new()).await.unwrap().is_empty());
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn dimension_drift_is_reported_as_internal() {
        let store = MemoryVectorStore::from_documents(docs(), Arc::new(DriftingEmbeddings))
            .await
            .unwrap();

        let err = store.similarity_search("license", 3).await.unwrap_err();
        assert!(matches!(err, RagError::Internal(_)));
    }
}
