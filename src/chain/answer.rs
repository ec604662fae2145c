use std::sync::Arc;

use super::prompt::build_answer_messages;
use crate::core::errors::RagError;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::rag::Document;

/// Answers the latest turn using only the supplied documents as grounding.
#[derive(Clone)]
pub struct DocumentAnswerer {
    model: Arc<dyn ChatModel>,
    system_template: String,
}

impl DocumentAnswerer {
    pub fn new(model: Arc<dyn ChatModel>, system_template: impl Into<String>) -> Self {
        Self {
            model,
            system_template: system_template.into(),
        }
    }

    /// With an empty `context` the template tells the model to refuse, so the
    /// reply is expected to be the refusal phrase.
    pub async fn answer(
        &self,
        messages: &[ChatMessage],
        context: &[Document],
    ) -> Result<String, RagError> {
        let prompt = build_answer_messages(&self.system_template, context, messages);
        tracing::debug!(
            "answering with {} context document(s) via {}",
            context.len(),
            self.model.name()
        );
        self.model.complete(ChatRequest::new(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CapturingModel {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatModel for CapturingModel {
        fn name(&self) -> &str {
            "capturing"
        }

        async fn complete(&self, request: ChatRequest) -> Result<String, RagError> {
            self.requests.lock().unwrap().push(request);
            Ok("MIT License です。".to_string())
        }
    }

    #[tokio::test]
    async fn system_prompt_carries_joined_context() {
        let model = Arc::new(CapturingModel {
            requests: Mutex::new(Vec::new()),
        });
        let answerer = DocumentAnswerer::new(model.clone(), "ctx:\n{context}");

        let docs = vec![
            Document::from_source("LangChain is MIT licensed.", "a"),
            Document::from_source("It was released in 2022.", "b"),
        ];
        let question = vec![ChatMessage::user("LangChainのライセンス形式は？")];

        let answer = answerer.answer(&question, &docs).await.unwrap();
        assert_eq!(answer, "MIT License です。");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0].messages;
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(
            sent[0].content,
            "ctx:\nLangChain is MIT licensed.\n\nIt was released in 2022."
        );
        assert_eq!(sent[1], question[0]);
    }

    #[tokio::test]
    async fn empty_context_still_calls_the_model() {
        let model = Arc::new(CapturingModel {
            requests: Mutex::new(Vec::new()),
        });
        let answerer = DocumentAnswerer::new(model.clone(), "ctx:[{context}]");

        answerer
            .answer(&[ChatMessage::user("q")], &[])
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].messages[0].content, "ctx:[]");
    }
}
