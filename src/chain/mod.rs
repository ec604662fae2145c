pub mod answer;
pub mod pipeline;
pub mod prompt;
pub mod selector;

pub use answer::DocumentAnswerer;
pub use pipeline::{ChainOutput, RetrievalChain};
pub use selector::{
    ContextRetriever, LastMessageRetriever, QueryRewriter, ResolvedQuery, RetrievalStrategy,
    TurnAwareRetriever,
};
