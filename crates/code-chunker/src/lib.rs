//! # codeqa chunker
//!
//! Turns a source tree into addressable chunks without a compiler frontend per language.
//!
//! ## Architecture
//!
//! ```text
//! Project root
//!     │
//!     ├──> FileScanner (.gitignore / .codeqaignore aware, sorted)
//!     │
//!     ├──> Language detection (extension → family)
//!     │
//!     └──> Chunk generation
//!          ├─> file chunk (fits the budget) or greedy line blocks
//!          ├─> class / function / interface spans via a SyntacticExtractor
//!          │    ├─> BraceDepthExtractor   (Rust, JS/TS, Go, Java, C#, ...)
//!          │    └─> IndentationExtractor  (Python, Ruby)
//!          └─> framework tag + importance heuristic
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codeqa_chunker::{ChunkKind, Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//! let code = "fn process(input: &str) -> String {\n    input.trim().to_uppercase()\n}\n";
//!
//! let out = chunker.chunk_source("src/process.rs", code);
//! assert_eq!(out.chunks[0].kind(), ChunkKind::File);
//! assert_eq!(out.chunks[1].symbol_name(), Some("process"));
//! ```

mod chunker;
mod config;
mod error;
mod frameworks;
mod language;
mod scanner;
mod strategy;
mod types;

pub use chunker::{
    count_by_kind, importance_for, is_entry_point, is_test_path, Chunker, ChunkingStats,
    FileChunks, TreeChunks,
};
pub use config::{ChunkerConfig, DEFAULT_MAX_CHUNK_BYTES, DEFAULT_MAX_FILE_BYTES};
pub use error::{ChunkerError, Result};
pub use frameworks::{detect_framework, framework_by_name, FrameworkSignature, FRAMEWORKS};
pub use language::{Language, LanguageFamily};
pub use scanner::{relative_path, FileScanner, ScanOutcome, SourceFile, IGNORE_FILE_NAME};
pub use strategy::{
    estimate_complexity, extractor_for, BraceDepthExtractor, IndentationExtractor,
    SyntacticExtractor, SyntacticSpan,
};
pub use types::{Chunk, ChunkDetail, ChunkId, ChunkKind, ChunkMetadata};
