pub mod chain;
pub mod core;
pub mod llm;
pub mod rag;
pub mod state;
