use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding batch settings for a rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Chunks embedded concurrently per batch
    pub batch_size: usize,

    /// Pause between two batches
    pub batch_delay_ms: u64,

    /// Deadline of a single embedding call
    pub embed_timeout_ms: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay_ms: 250,
            embed_timeout_ms: 30_000,
        }
    }
}

impl IndexingConfig {
    #[must_use]
    pub const fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    #[must_use]
    pub const fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(IndexerError::Configuration(
                "indexing.batch_size must be > 0".to_string(),
            ));
        }
        if self.embed_timeout_ms == 0 {
            return Err(IndexerError::Configuration(
                "indexing.embed_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
