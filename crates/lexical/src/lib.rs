//! BM25 lexical index and sparse term vectors.
//!
//! The index is rebuilt wholesale from the chunk corpus; query-time and corpus-time sparse
//! vectors are both weighted with the same [`CorpusStats`], so their dot product is meaningful.

mod bm25;
mod error;
mod sparse;
mod tokenizer;

pub use bm25::{Bm25Index, Bm25Params, CorpusStats};
pub use error::{LexicalError, Result};
pub use sparse::SparseVector;
pub use tokenizer::{is_stop_word, split_identifier, tokenize, STOP_WORDS};
