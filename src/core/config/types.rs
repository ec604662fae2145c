use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Typed view of the merged configuration tree.
///
/// Every section has defaults so an absent `config.yml` still yields a usable
/// setup; only the provider credential has to come from somewhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub loader: LoaderConfig,
    pub splitter: SplitterConfig,
    pub retriever: RetrieverConfig,
    pub prompts: PromptConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
    pub embedding_batch_size: usize,
    /// Replace newlines with spaces before embedding.
    pub strip_new_lines: bool,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.0,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            strip_new_lines: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub url: String,
    /// CSS selector whose text becomes the document body.
    pub selector: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            selector: DEFAULT_SELECTOR.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    pub k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { k: DEFAULT_TOP_K }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Answer template; `{context}` is replaced by the retrieved text.
    pub system_template: String,
    /// Instruction appended after the history when rewriting a follow-up.
    pub query_transform: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_template: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            query_transform: DEFAULT_QUERY_TRANSFORM.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Also write a daily rolling file under the log directory.
    pub file: bool,
}
