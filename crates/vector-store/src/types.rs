use crate::error::{Result, VectorStoreError};
use codeqa_chunker::Chunk;
use codeqa_lexical::SparseVector;
use serde::{Deserialize, Serialize};

/// A chunk with both of its vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk: Chunk,
    pub dense: Vec<f32>,
    #[serde(default)]
    pub sparse: SparseVector,
}

impl StoredChunk {
    #[must_use]
    pub const fn new(chunk: Chunk, dense: Vec<f32>, sparse: SparseVector) -> Self {
        Self {
            chunk,
            dense,
            sparse,
        }
    }

    /// NaN / infinite components cannot be ranked or persisted
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.dense.iter().all(|v| v.is_finite())
    }

    /// All-zero dense vector written when embedding failed
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.dense.iter().all(|v| *v == 0.0)
    }
}

/// One hybrid search result with its score components
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    /// Combined score
    pub score: f32,
    /// Cosine similarity of the dense vectors
    pub dense_score: f32,
    /// Dot product of the (normalized) sparse vectors
    pub sparse_score: f32,
}

/// Dense/sparse fusion weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    /// Weight of the dense cosine score; the sparse score gets `1 - dense_weight`
    pub dense_weight: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self { dense_weight: 0.5 }
    }
}

impl HybridWeights {
    pub fn new(dense_weight: f32) -> Result<Self> {
        let weights = Self { dense_weight };
        weights.validate()?;
        Ok(weights)
    }

    #[must_use]
    pub fn sparse_weight(&self) -> f32 {
        1.0 - self.dense_weight
    }

    #[must_use]
    pub fn combine(&self, dense: f32, sparse: f32) -> f32 {
        self.dense_weight * dense + self.sparse_weight() * sparse
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.dense_weight) {
            return Err(VectorStoreError::InvalidConfig(format!(
                "hybrid.dense_weight must be within [0, 1], got {}",
                self.dense_weight
            )));
        }
        Ok(())
    }
}
