use thiserror::Error;

/// Result type for lexical index operations
pub type Result<T> = std::result::Result<T, LexicalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexicalError {
    #[error("Invalid BM25 parameters: {0}")]
    InvalidParams(String),

    #[error("Document index {index} out of range (corpus has {len} documents)")]
    DocumentOutOfRange { index: usize, len: usize },
}
