use crate::config::Method;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DedupError>;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("{method} matching is not available in this build")]
    NotImplemented { method: Method },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Deduplication cancelled")]
    Cancelled,

    #[error("Deduplication timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DedupError {
    /// True for errors raised while validating a configuration, before any data is read.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DedupError::Configuration(_))
    }

    /// True for errors caused by the strategy-boundary interrupt.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, DedupError::Cancelled | DedupError::Timeout { .. })
    }
}
