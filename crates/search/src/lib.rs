//! # codeqa search
//!
//! Query planning and answering on top of the indexed corpus.
//!
//! ## Pipeline
//!
//! ```text
//! question
//!     │
//!     ├──> IntentClassifier (weighted phrase patterns + session boosts)
//!     │      └─> QueryParameters (keywords, frameworks, file types, components, scope, complexity)
//!     │
//!     ├──> QueryRewrite (optional, generator) ── DENSE / SPARSE forms, raw text on failure
//!     │
//!     ├──> embed dense form ── lexical-only when embedding fails
//!     │
//!     ├──> VectorStore::hybrid_search (cap × candidate_multiplier candidates)
//!     │
//!     └──> RelevanceScorer ── keyword / framework / component matches, intent affinity,
//!                             importance; top min(cap, max_results)
//! ```
//!
//! [`RetrievalEngine`] ties the indexing and query pipelines of one project together over a
//! shared [`VectorStore`](codeqa_vector_store::VectorStore).
//!
//! ## Example
//!
//! ```no_run
//! use codeqa_provider::Capabilities;
//! use codeqa_search::{EngineConfig, RetrievalEngine};
//!
//! # async fn run() -> codeqa_search::Result<()> {
//! let root = std::path::Path::new(".");
//! let config = EngineConfig::load(root, None)?;
//! let caps = Capabilities::from_config(&config.provider)?;
//! let engine = RetrievalEngine::open(root, config, caps).await?;
//!
//! engine.index_codebase().await?;
//! let response = engine.query("where is the login handled?", Some(5)).await?;
//! for hit in &response.ranked {
//!     println!("{} {:.2} {}", hit.chunk.source_path, hit.score, hit.explanation);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod intent;
mod params;
mod query;
mod relevance;
mod rewrite;

pub use config::{EngineConfig, QueryConfig, BATCH_SIZE_ENV, CONFIG_FILE_NAME};
pub use engine::RetrievalEngine;
pub use error::{Result, SearchError};
pub use intent::{
    pattern_weight, IntentClassifier, IntentType, QueryIntent, SessionContext, UserRole,
};
pub use params::{extract_parameters, ComplexityTier, QueryParameters, ScopeTier};
pub use query::{QueryOrchestrator, QueryResponse};
pub use relevance::{ContextType, RankedChunk, RelevanceScorer, MIN_RELEVANCE};
pub use rewrite::{parse_rewrite, QueryRewrite};
