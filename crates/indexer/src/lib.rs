//! # codeqa indexer
//!
//! Full-corpus rebuilds of a project's retrieval index.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.gitignore / .codeqaignore aware)
//!     │      └─> Source files
//!     │
//!     ├──> Chunker (file / block / declaration chunks)
//!     │      └─> Chunks
//!     │
//!     ├──> BM25 (corpus stats + sparse vectors)
//!     │
//!     ├──> Embedding batches (bounded parallelism, zero-vector fallback)
//!     │
//!     └──> Vector Store swap + .codeqa/index.json
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codeqa_indexer::IndexingOrchestrator;
//! use codeqa_provider::{Capabilities, StubEmbedder};
//! use codeqa_vector_store::VectorStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let caps = Capabilities::new().with_embedder(Arc::new(StubEmbedder::default()));
//!     let store = Arc::new(VectorStore::default());
//!     let indexer = IndexingOrchestrator::new("/path/to/project", caps, store)?;
//!     let report = indexer.index().await?;
//!
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod index_lock;
mod indexer;
mod progress;
mod stats;

pub use config::IndexingConfig;
pub use error::{IndexerError, Result};
pub use indexer::IndexingOrchestrator;
pub use progress::{IndexPhase, IndexProgress, LogProgress, ProgressSink};
pub use stats::IndexReport;
