use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Default hard limit for a single chunk, in bytes
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1_500;

/// Files above this size are never read
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576;

/// Configuration for chunking behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk size in bytes (hard limit for every emitted chunk)
    pub max_chunk_bytes: usize,

    /// Maximum source file size in bytes; larger files are skipped during discovery
    pub max_file_bytes: u64,

    /// Extract class/function/interface chunks for recognized languages
    pub extract_syntactic: bool,

    /// Directory names skipped in addition to the built-in ignore list
    pub extra_ignored_dirs: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            extract_syntactic: true,
            extra_ignored_dirs: Vec::new(),
        }
    }
}

impl ChunkerConfig {
    /// Config with an explicit chunk budget and defaults for everything else
    #[must_use]
    pub fn with_max_chunk_bytes(max_chunk_bytes: usize) -> Self {
        Self {
            max_chunk_bytes,
            ..Default::default()
        }
    }

    /// Config that only emits file and block chunks
    #[must_use]
    pub fn lines_only() -> Self {
        Self {
            extract_syntactic: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_bytes == 0 {
            return Err(ChunkerError::invalid_config("max_chunk_bytes must be > 0"));
        }

        if self.max_file_bytes == 0 {
            return Err(ChunkerError::invalid_config("max_file_bytes must be > 0"));
        }

        if let Some(dir) = self
            .extra_ignored_dirs
            .iter()
            .find(|dir| dir.trim().is_empty() || dir.contains('/') || dir.contains('\\'))
        {
            return Err(ChunkerError::invalid_config(format!(
                "extra_ignored_dirs entry '{dir}' must be a single directory name"
            )));
        }

        Ok(())
    }
}
