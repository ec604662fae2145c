use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A piece of text plus free-form metadata (`source`, `loc`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: Value,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: Value) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    pub fn from_source(page_content: impl Into<String>, source: &str) -> Self {
        Self::new(page_content, json!({ "source": source }))
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }

    /// `(from, to)` line range recorded by the splitter.
    pub fn line_range(&self) -> Option<(u64, u64)> {
        let lines = self.metadata.get("loc")?.get("lines")?;
        Some((lines.get("from")?.as_u64()?, lines.get("to")?.as_u64()?))
    }
}

/// A stored document paired with its similarity to a query (higher = closer).
/// `id` is the one `add_documents` returned for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub id: String,
    pub document: Document,
    pub score: f32,
}
