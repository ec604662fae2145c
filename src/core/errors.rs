use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }

    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        RagError::Config(err.to_string())
    }

    /// True for failures raised by a remote collaborator (page host, embedding
    /// or chat provider). These are surfaced to the caller unchanged.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RagError::Fetch(_)
                | RagError::Unauthorized(_)
                | RagError::RateLimited(_)
                | RagError::Timeout(_)
                | RagError::Upstream(_)
        )
    }
}
