use serde::Serialize;
use std::fmt;

/// Where a rebuild currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPhase {
    #[default]
    Idle,
    Discovering,
    Chunking,
    LexicalIndexBuild,
    EmbeddingBatch,
    VectorStoreSwap,
    Failed,
}

impl IndexPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Chunking => "chunking",
            Self::LexicalIndexBuild => "lexical_index_build",
            Self::EmbeddingBatch => "embedding_batch",
            Self::VectorStoreSwap => "vector_store_swap",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for IndexPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete milestone of a rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IndexProgress {
    Phase { phase: IndexPhase },
    Discovered { files: usize },
    Chunked { chunks: usize },
    Batch {
        batch: usize,
        batches: usize,
        embedded: usize,
    },
}

/// Receives rebuild milestones
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: IndexProgress);
}

/// Default sink: one log line per milestone
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: IndexProgress) {
        match progress {
            IndexProgress::Phase { phase } => log::debug!("Index phase: {phase}"),
            IndexProgress::Discovered { files } => log::info!("Discovered {files} files"),
            IndexProgress::Chunked { chunks } => log::info!("Produced {chunks} chunks"),
            IndexProgress::Batch {
                batch,
                batches,
                embedded,
            } => log::info!("Embedding batch {batch}/{batches} ({embedded} embedded)"),
        }
    }
}
