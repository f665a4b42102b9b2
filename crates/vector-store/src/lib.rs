//! # codeqa vector store
//!
//! Holds chunk content with its dense and sparse vectors and answers hybrid queries.
//!
//! ## Architecture
//!
//! ```text
//! StoredChunk[] + CorpusStats
//!     │
//!     ├──> Generation (immutable snapshot, swapped behind RwLock<Arc<_>>)
//!     │
//!     ├──> hybrid_search: dense_weight · cosine + (1 − dense_weight) · sparse dot
//!     │
//!     └──> .codeqa/index.json (temp file + atomic rename)
//! ```

mod corpus;
mod error;
mod paths;
mod store;
mod types;

pub use corpus::INDEX_SCHEMA_VERSION;
pub use error::{Result, VectorStoreError};
pub use paths::{
    index_path_for_project_root, lock_path_for_project_root, state_dir_for_project_root,
    INDEX_FILE_NAME, LOCK_FILE_NAME, STATE_DIR_NAME,
};
pub use store::{cosine, VectorStore};
pub use types::{HybridWeights, SearchHit, StoredChunk};

// Re-export chunk and lexical types for convenience
pub use codeqa_chunker::{Chunk, ChunkId, ChunkKind};
pub use codeqa_lexical::{CorpusStats, SparseVector};
