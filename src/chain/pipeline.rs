//! Conversational retrieval chain.
//!
//! Input flows through two fixed stages: `context` is attached first, then
//! `answer` is produced from the messages and that context. Each stage only
//! adds its own field to the record.

use std::sync::Arc;

use serde::Serialize;

use super::answer::DocumentAnswerer;
use super::selector::ContextRetriever;
use crate::core::errors::RagError;
use crate::llm::ChatMessage;
use crate::rag::Document;

/// Everything a chain run produced. `messages` is the caller's input as given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainOutput {
    pub messages: Vec<ChatMessage>,
    pub context: Vec<Document>,
    pub answer: String,
}

impl ChainOutput {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            context: Vec::new(),
            answer: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct RetrievalChain {
    context_source: Arc<dyn ContextRetriever>,
    answerer: DocumentAnswerer,
}

impl RetrievalChain {
    pub fn new(context_source: Arc<dyn ContextRetriever>, answerer: DocumentAnswerer) -> Self {
        Self {
            context_source,
            answerer,
        }
    }

    pub async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChainOutput, RagError> {
        if messages.is_empty() {
            return Err(RagError::InvalidInput(
                "message history is empty".to_string(),
            ));
        }

        let mut output = ChainOutput::new(messages);
        self.assign_context(&mut output).await?;
        self.assign_answer(&mut output).await?;
        Ok(output)
    }

    async fn assign_context(&self, output: &mut ChainOutput) -> Result<(), RagError> {
        output.context = self.context_source.retrieve_for(&output.messages).await?;
        tracing::debug!("context stage: {} document(s)", output.context.len());
        Ok(())
    }

    async fn assign_answer(&self, output: &mut ChainOutput) -> Result<(), RagError> {
        output.answer = self
            .answerer
            .answer(&output.messages, &output.context)
            .await?;
        tracing::debug!("answer stage: {} char(s)", output.answer.chars().count());
        Ok(())
    }
}
