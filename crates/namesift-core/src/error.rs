//! Error types for namesift

/// Result type alias using namesift's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for classification operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input name (caller bug, always surfaced)
    #[error("name validation error: {0}")]
    NameValidation(String),

    /// No layer cleared the elevated bar in require-high-confidence mode
    #[error("no classification reached required confidence {required:.2} (best: {best:.2})")]
    ConfidenceThreshold { required: f64, best: f64 },

    /// Transient LLM provider failure (retried internally, absorbed by the LLM layer)
    #[error("llm classification error: {0}")]
    Llm(String),

    /// Learning-store I/O failure (logged, degrades to "no cache hit")
    #[error("learning cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new name-validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::NameValidation(msg.into())
    }

    /// Create a new LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a new cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
