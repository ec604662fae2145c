use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::RagError;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// chat completion (non-streaming); returns the reply text as-is
    async fn complete(&self, request: ChatRequest) -> Result<String, RagError>;
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// embed a batch of passages, one vector per input in input order
    async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// embed a single search query
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_documents(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Internal("Embedding response was empty".to_string()))
    }
}
