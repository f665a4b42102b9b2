use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Failures of an embedding or generation capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The capability was never configured
    #[error("No {0} provider configured")]
    NotConfigured(&'static str),

    /// The provider rejected or failed the request
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    pub fn request(provider: impl Into<String>, message: impl ToString) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}
