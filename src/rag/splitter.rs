//! Recursive character text splitter.
//!
//! Splits on the coarsest separator present in the text (`"\n\n"`, then
//! `"\n"`, then `" "`, then single characters), recursing into any piece that
//! is still too long, and greedily merges small pieces back up to
//! `chunk_size` characters with up to `chunk_overlap` characters carried over
//! between neighbours. Lengths are counted in `char`s.

use std::collections::VecDeque;

use serde_json::{json, Map, Value};

use super::document::Document;
use crate::core::config::SplitterConfig;
use crate::core::errors::RagError;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    /// Keep each separator at the start of the piece that follows it.
    keep_separator: bool,
}

impl RecursiveCharacterTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            keep_separator: true,
        })
    }

    pub fn from_config(config: &SplitterConfig) -> Result<Self, RagError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn with_keep_separator(mut self, keep_separator: bool) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document, copying its metadata and adding
    /// `loc.lines.{from,to}` (1-based) for each chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        let chunks: Vec<Document> = documents
            .iter()
            .flat_map(|doc| self.create_documents(&doc.page_content, &doc.metadata))
            .collect();

        tracing::info!(
            "Split {} document(s) into {} chunk(s) (chunk_size={}, chunk_overlap={})",
            documents.len(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );
        chunks
    }

    fn create_documents(&self, text: &str, metadata: &Value) -> Vec<Document> {
        let mut documents = Vec::new();
        let mut line_counter: usize = 1;
        // Byte offset and byte length of the previous chunk inside `text`.
        let mut previous: Option<(usize, usize)> = None;

        for chunk in self.split_text(text) {
            let search_from = match previous {
                Some((index, _)) => next_char_boundary(text, index + 1),
                None => 0,
            };
            let index = text[search_from..]
                .find(chunk.as_str())
                .map(|offset| offset + search_from);

            match (previous, index) {
                (None, Some(index)) => {
                    line_counter += count_newlines(&text[..index]);
                }
                (Some((prev_index, prev_len)), Some(index)) => {
                    let prev_end = prev_index + prev_len;
                    if prev_end < index {
                        line_counter += count_newlines(&text[prev_end..index]);
                    } else if prev_end > index {
                        line_counter =
                            line_counter.saturating_sub(count_newlines(&text[index..prev_end]));
                    }
                }
                _ => {}
            }

            let newlines = count_newlines(&chunk);
            let chunk_metadata = with_line_range(metadata, line_counter, line_counter + newlines);
            line_counter += newlines;

            if let Some(index) = index {
                previous = Some((index, chunk.len()));
            }
            documents.push(Document::new(chunk, chunk_metadata));
        }

        documents
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = self.split_on_separator(text, separator);
        let merge_separator = if self.keep_separator { "" } else { separator };

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in splits {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, merge_separator));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, merge_separator));
        }

        final_chunks
    }

    fn split_on_separator<'a>(&self, text: &'a str, separator: &str) -> Vec<&'a str> {
        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else if self.keep_separator {
            // Cut in front of every occurrence, overlapping ones included.
            let mut pieces = Vec::new();
            let mut start = 0;
            for (i, _) in text.char_indices() {
                if i > start && text[i..].starts_with(separator) {
                    pieces.push(&text[start..i]);
                    start = i;
                }
            }
            pieces.push(&text[start..]);
            pieces
        } else {
            text.split(separator).collect()
        };

        pieces.into_iter().filter(|piece| !piece.is_empty()).collect()
    }

    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let joiner_len = |count: usize| if count > 0 { separator_len } else { 0 };

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total: usize = 0;

        for &piece in splits {
            let len = char_len(piece);

            if total + len + joiner_len(current.len()) > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current, separator) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (total + len + joiner_len(current.len()) > self.chunk_size && total > 0)
                    {
                        let Some(first) = current.front() else {
                            break;
                        };
                        let removed = char_len(first)
                            + if current.len() > 1 { separator_len } else { 0 };
                        total = total.saturating_sub(removed);
                        current.pop_front();
                    }
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_pieces(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

fn join_pieces(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn with_line_range(metadata: &Value, from: usize, to: usize) -> Value {
    let mut map = match metadata {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let mut loc = match map.get("loc") {
        Some(Value::Object(loc)) => loc.clone(),
        _ => Map::new(),
    };
    loc.insert("lines".to_string(), json!({ "from": from, "to": to }));
    map.insert("loc".to_string(), Value::Object(loc));

    Value::Object(map)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn count_newlines(text: &str) -> usize {
    text.matches('\n').count()
}

fn next_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}
