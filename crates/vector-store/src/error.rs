use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Non-finite value in dense vector of {0}")]
    NonFiniteVector(String),

    /// Missing, corrupt or incompatible persisted index
    #[error("Index state error: {0}")]
    IndexState(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VectorStoreError {
    pub fn missing_index(path: &Path) -> Self {
        Self::IndexState(format!(
            "no index found at {}; run `codeqa index` first",
            path.display()
        ))
    }

    pub fn corrupt_index(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::IndexState(format!(
            "index at {} is unreadable ({reason}); rebuild it with `codeqa index`",
            path.display()
        ))
    }
}
