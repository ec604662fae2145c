//! Turn-aware retrieval.
//!
//! The first turn of a conversation is searched with the user's words as-is.
//! Later turns are usually follow-ups ("tell me more") that make poor search
//! queries on their own, so the whole history is first condensed into a
//! standalone query by the chat model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use super::prompt::build_rewrite_messages;
use crate::core::errors::RagError;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::rag::{Document, Retriever};

/// How the search query is obtained for a given history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// Single message: search with its content verbatim.
    RawQuery,
    /// Ongoing conversation: search with a model-written standalone query.
    RewrittenQuery,
}

impl RetrievalStrategy {
    /// History length is the only discriminant. An empty history is rejected.
    pub fn for_history(messages: &[ChatMessage]) -> Result<Self, RagError> {
        match messages.len() {
            0 => Err(RagError::InvalidInput(
                "message history is empty".to_string(),
            )),
            1 => Ok(RetrievalStrategy::RawQuery),
            _ => Ok(RetrievalStrategy::RewrittenQuery),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStrategy::RawQuery => "raw_query",
            RetrievalStrategy::RewrittenQuery => "rewritten_query",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub strategy: RetrievalStrategy,
    pub text: String,
}

/// Turns a conversation into one standalone search query.
#[derive(Clone)]
pub struct QueryRewriter {
    model: Arc<dyn ChatModel>,
    instruction: String,
}

impl QueryRewriter {
    pub fn new(model: Arc<dyn ChatModel>, instruction: impl Into<String>) -> Self {
        Self {
            model,
            instruction: instruction.into(),
        }
    }

    /// The model's reply is returned untouched; it is not checked to be a
    /// bare query.
    pub async fn rewrite(&self, messages: &[ChatMessage]) -> Result<String, RagError> {
        let request = ChatRequest::new(build_rewrite_messages(messages, &self.instruction));
        let query = self.model.complete(request).await?;
        tracing::info!("Rewrote {} message(s) into query: {}", messages.len(), query);
        Ok(query)
    }
}

/// Maps a conversation to the documents that ground the next answer.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve_for(&self, messages: &[ChatMessage]) -> Result<Vec<Document>, RagError>;
}

/// Searches with the last message's content, whatever the history length.
#[derive(Clone)]
pub struct LastMessageRetriever {
    retriever: Arc<dyn Retriever>,
}

impl LastMessageRetriever {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl ContextRetriever for LastMessageRetriever {
    async fn retrieve_for(&self, messages: &[ChatMessage]) -> Result<Vec<Document>, RagError> {
        let last = messages.last().ok_or_else(|| {
            RagError::InvalidInput("message history is empty".to_string())
        })?;
        self.retriever.retrieve(&last.content).await
    }
}

#[derive(Clone)]
pub struct TurnAwareRetriever {
    retriever: Arc<dyn Retriever>,
    rewriter: QueryRewriter,
}

impl TurnAwareRetriever {
    pub fn new(retriever: Arc<dyn Retriever>, rewriter: QueryRewriter) -> Self {
        Self {
            retriever,
            rewriter,
        }
    }

    pub async fn resolve_query(&self, messages: &[ChatMessage]) -> Result<ResolvedQuery, RagError> {
        let strategy = RetrievalStrategy::for_history(messages)?;
        let text = match strategy {
            RetrievalStrategy::RawQuery => messages[0].content.clone(),
            RetrievalStrategy::RewrittenQuery => self.rewriter.rewrite(messages).await?,
        };
        Ok(ResolvedQuery { strategy, text })
    }
}

#[async_trait]
impl ContextRetriever for TurnAwareRetriever {
    async fn retrieve_for(&self, messages: &[ChatMessage]) -> Result<Vec<Document>, RagError> {
        let span = tracing::info_span!("chat_retriever_chain", turns = messages.len());
        async {
            let query = self.resolve_query(messages).await?;
            tracing::info!("Retrieval strategy: {}", query.strategy.as_str());
            let documents = self.retriever.retrieve(&query.text).await?;
            tracing::info!("Retrieved {} document(s)", documents.len());
            Ok::<_, RagError>(documents)
        }
        .instrument(span)
        .await
    }
}
