use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{ChatModel, EmbeddingModel};
use super::types::ChatRequest;
use crate::core::config::OpenAiConfig;
use crate::core::errors::RagError;

/// Chat and embedding client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    batch_size: usize,
    strip_new_lines: bool,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RagError::internal)?;

        if config.api_key.is_none() {
            tracing::warn!(
                "No API key configured for {}; requests are sent unauthenticated",
                config.base_url
            );
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
            batch_size: config.embedding_batch_size.max(1),
            strip_new_lines: config.strip_new_lines,
            client,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn chat_body(&self, request: &ChatRequest) -> Value {
        json!({
            "model": self.chat_model,
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.temperature),
        })
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value, RagError> {
        let res = builder.send().await.map_err(map_transport_error)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(map_status_error(status, what, &text));
        }

        res.json::<Value>().await.map_err(map_transport_error)
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, RagError> {
        let body = self.chat_body(&request);

        tracing::debug!("chat completion: model={}", self.chat_model);
        let payload = self
            .send(self.post("/chat/completions").json(&body), "chat")
            .await?;

        extract_message_content(&payload)
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiProvider {
    async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut embeddings = Vec::with_capacity(inputs.len());

        for batch in inputs.chunks(self.batch_size) {
            let texts: Vec<String> = batch
                .iter()
                .map(|text| {
                    if self.strip_new_lines {
                        text.replace('\n', " ")
                    } else {
                        text.clone()
                    }
                })
                .collect();

            let body = json!({
                "model": self.embedding_model,
                "input": texts,
            });

            tracing::debug!(
                "embedding batch: model={}, inputs={}",
                self.embedding_model,
                texts.len()
            );
            let payload = self.send(self.post("/embeddings").json(&body), "embed").await?;
            let response: EmbeddingResponse =
                serde_json::from_value(payload).map_err(RagError::internal)?;
            embeddings.extend(order_embeddings(response.data, batch.len())?);
        }

        Ok(embeddings)
    }
}

/// Vectors in input order. The provider's indices must be exactly
/// `0..expected`; a gap or duplicate would pair vectors with the wrong text.
fn order_embeddings(
    mut items: Vec<EmbeddingItem>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    if items.len() != expected {
        return Err(RagError::Internal(format!(
            "Embedding count mismatch: sent {}, received {}",
            expected,
            items.len()
        )));
    }

    items.sort_by_key(|item| item.index);
    for (position, item) in items.iter().enumerate() {
        if item.index != position {
            return Err(RagError::Internal(format!(
                "Embedding index {} found at position {}",
                item.index, position
            )));
        }
    }

    Ok(items.into_iter().map(|item| item.embedding).collect())
}

fn extract_message_content(payload: &Value) -> Result<String, RagError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RagError::Internal("Chat response has no message content".to_string()))
}

fn map_transport_error(err: reqwest::Error) -> RagError {
    if err.is_timeout() {
        RagError::Timeout(err.to_string())
    } else {
        RagError::Upstream(err.to_string())
    }
}

fn map_status_error(status: StatusCode, what: &str, body: &str) -> RagError {
    let detail = format!("{} request failed with {}: {}", what, status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RagError::Unauthorized(detail),
        StatusCode::TOO_MANY_REQUESTS => RagError::RateLimited(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RagError::Timeout(detail),
        _ => RagError::Upstream(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, "chat", "bad key"),
            RagError::Unauthorized(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::FORBIDDEN, "chat", ""),
            RagError::Unauthorized(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, "embed", "slow down"),
            RagError::RateLimited(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::GATEWAY_TIMEOUT, "chat", ""),
            RagError::Timeout(_)
        ));

        let err = map_status_error(StatusCode::INTERNAL_SERVER_ERROR, "chat", "boom");
        assert!(matches!(err, RagError::Upstream(_)));
        assert!(err.to_string().contains("boom"));
        assert!(err.is_upstream());
    }

    #[test]
    fn message_content_is_returned_verbatim() {
        let payload = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  LangChain ライセンス 詳細\n" } }]
        });
        assert_eq!(
            extract_message_content(&payload).unwrap(),
            "  LangChain ライセンス 詳細\n"
        );
    }

    #[test]
    fn missing_content_is_an_internal_error() {
        let payload = json!({ "choices": [] });
        assert!(matches!(
            extract_message_content(&payload),
            Err(RagError::Internal(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = OpenAiConfig {
            base_url: "http://localhost:1234/v1/".to_string(),
            embedding_batch_size: 0,
            ..OpenAiConfig::default()
        };
        let provider = OpenAiProvider::new(&config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:1234/v1");
        assert_eq!(provider.batch_size, 1);
    }

    fn embedding_items(payload: Value) -> Vec<EmbeddingItem> {
        serde_json::from_value::<EmbeddingResponse>(payload)
            .unwrap()
            .data
    }

    #[test]
    fn embedding_items_are_reordered_by_index() {
        let items = embedding_items(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        }));
        let vectors = order_embeddings(items, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn duplicate_embedding_index_is_rejected() {
        let items = embedding_items(json!({
            "data": [
                { "index": 0, "embedding": [1.0] },
                { "index": 0, "embedding": [2.0] }
            ]
        }));
        assert!(matches!(order_embeddings(items, 2), Err(RagError::Internal(_))));
    }

    #[test]
    fn gap_in_embedding_indices_is_rejected() {
        let items = embedding_items(json!({
            "data": [
                { "index": 0, "embedding": [1.0] },
                { "index": 2, "embedding": [2.0] }
            ]
        }));
        assert!(matches!(order_embeddings(items, 2), Err(RagError::Internal(_))));
    }

    #[test]
    fn embedding_count_mismatch_is_rejected() {
        let items = embedding_items(json!({
            "data": [ { "index": 0, "embedding": [1.0] } ]
        }));
        assert!(matches!(order_embeddings(items, 2), Err(RagError::Internal(_))));
    }

    #[test]
    fn chat_body_carries_only_model_messages_and_temperature() {
        let provider = OpenAiProvider::new(&OpenAiConfig::default()).unwrap();

        let body = provider.chat_body(&ChatRequest::new(vec![ChatMessage::user("q")]));
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["content"], "q");

        let mut hot = ChatRequest::new(Vec::new());
        hot.temperature = Some(0.7);
        assert_eq!(provider.chat_body(&hot)["temperature"], 0.7);
    }
}
