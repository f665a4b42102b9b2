use std::path::PathBuf;
use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while discovering and chunking source files
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// A file or directory could not be listed or read
    #[error("Discovery error at {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    /// A file was read but could not be turned into chunks
    #[error("Extraction error in {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChunkerError {
    /// Create a discovery error
    pub fn discovery(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Discovery {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Discovery and extraction failures are per-file and never abort a scan.
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(self, Self::Discovery { .. } | Self::Extraction { .. })
    }
}
