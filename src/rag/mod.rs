//! Retrieval building blocks.
//!
//! This module provides:
//! - `WebLoader`: fetches a page and turns it into a `Document`
//! - `RecursiveCharacterTextSplitter`: cuts documents into bounded chunks
//! - `MemoryVectorStore`: embeds chunks and answers cosine top-k queries
//! - `VectorStoreRetriever`: a fixed-`k` view of a store

pub mod document;
pub mod loader;
pub mod memory;
pub mod retriever;
pub mod splitter;
pub mod store;
pub mod vector_math;

pub use document::{Document, ScoredDocument};
pub use loader::{DocumentLoader, WebLoader};
pub use memory::MemoryVectorStore;
pub use retriever::{Retriever, VectorStoreRetriever};
pub use splitter::RecursiveCharacterTextSplitter;
pub use store::VectorStore;
