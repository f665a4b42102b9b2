use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Empty query")]
    EmptyQuery,

    /// Missing, empty or unreadable index
    #[error("Index state error: {0}")]
    IndexState(String),

    /// Invalid config file, value or override; names the offending key
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] codeqa_vector_store::VectorStoreError),

    #[error("Indexer error: {0}")]
    IndexerError(#[from] codeqa_indexer::IndexerError),

    #[error("Provider error: {0}")]
    ProviderError(#[from] codeqa_provider::ProviderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn config(key: &str, reason: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("{key}: {reason}"))
    }
}
