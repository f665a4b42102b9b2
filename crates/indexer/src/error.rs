use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// Missing capability or invalid settings; raised before anything is touched
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] codeqa_chunker::ChunkerError),

    #[error("Lexical index error: {0}")]
    LexicalError(#[from] codeqa_lexical::LexicalError),

    #[error("Provider error: {0}")]
    ProviderError(#[from] codeqa_provider::ProviderError),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] codeqa_vector_store::VectorStoreError),

    /// The new corpus could not be persisted
    #[error("Index state error: {0}")]
    IndexState(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
