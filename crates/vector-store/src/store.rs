use crate::corpus::PersistedIndex;
use crate::error::{Result, VectorStoreError};
use crate::types::{HybridWeights, SearchHit, StoredChunk};
use codeqa_chunker::{Chunk, ChunkId, ChunkKind};
use codeqa_lexical::{CorpusStats, SparseVector};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// One immutable snapshot of the corpus
#[derive(Debug, Default)]
pub(crate) struct Generation {
    entries: Vec<Arc<StoredChunk>>,
    by_id: HashMap<ChunkId, usize>,
    dimension: Option<usize>,
    stats: Arc<CorpusStats>,
}

impl Generation {
    fn build(entries: Vec<StoredChunk>, stats: CorpusStats) -> Result<Self> {
        let mut generation = Self {
            stats: Arc::new(stats),
            ..Self::default()
        };
        for entry in entries {
            generation.insert(Arc::new(entry))?;
        }
        Ok(generation)
    }

    fn check_dimension(&self, entry: &StoredChunk) -> Result<Option<usize>> {
        if !entry.is_finite() {
            return Err(VectorStoreError::NonFiniteVector(
                entry.chunk.id.as_str().to_string(),
            ));
        }
        if entry.is_placeholder() {
            return Ok(self.dimension);
        }
        let actual = entry.dense.len();
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(VectorStoreError::InvalidDimension { expected, actual })
            }
            _ => Ok(Some(actual)),
        }
    }

    fn insert(&mut self, entry: Arc<StoredChunk>) -> Result<()> {
        self.dimension = self.check_dimension(&entry)?;
        if let Some(&slot) = self.by_id.get(&entry.chunk.id) {
            self.entries[slot] = entry;
        } else {
            self.by_id.insert(entry.chunk.id.clone(), self.entries.len());
            self.entries.push(entry);
        }
        Ok(())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &StoredChunk> {
        self.entries.iter().map(AsRef::as_ref)
    }

    pub(crate) const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub(crate) fn stats(&self) -> &CorpusStats {
        &self.stats
    }
}

/// In-memory chunk store with hybrid dense + sparse search.
///
/// Readers work on an `Arc` snapshot; writers build a new generation and swap the reference, so a
/// query never observes a half-replaced corpus.
#[derive(Debug)]
pub struct VectorStore {
    current: RwLock<Arc<Generation>>,
    weights: HybridWeights,
}

impl Default for VectorStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::default())),
            weights: HybridWeights::default(),
        }
    }
}

impl VectorStore {
    pub fn new(weights: HybridWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn weights(&self) -> HybridWeights {
        self.weights
    }

    pub(crate) fn snapshot(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn swap(&self, generation: Generation) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(generation);
    }

    /// Insert or replace one chunk (copy-on-write)
    pub fn upsert(&self, entry: StoredChunk) -> Result<()> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Generation {
            entries: guard.entries.clone(),
            by_id: guard.by_id.clone(),
            dimension: guard.dimension,
            stats: Arc::clone(&guard.stats),
        };
        next.insert(Arc::new(entry))?;
        *guard = Arc::new(next);
        Ok(())
    }

    /// Replace the whole corpus at once. On error the previous corpus stays in place.
    pub fn replace_all(&self, entries: Vec<StoredChunk>, stats: CorpusStats) -> Result<()> {
        let generation = Generation::build(entries, stats)?;
        log::debug!(
            "Swapping in corpus generation with {} chunks",
            generation.entries.len()
        );
        self.swap(generation);
        Ok(())
    }

    pub fn clear_all(&self) {
        self.swap(Generation::default());
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.snapshot().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.snapshot().dimension
    }

    /// Lexical statistics of the current generation
    #[must_use]
    pub fn stats(&self) -> Arc<CorpusStats> {
        Arc::clone(&self.snapshot().stats)
    }

    #[must_use]
    pub fn get(&self, id: &ChunkId) -> Option<StoredChunk> {
        let generation = self.snapshot();
        generation
            .by_id
            .get(id)
            .map(|&slot| generation.entries[slot].as_ref().clone())
    }

    /// All chunks in insertion order
    #[must_use]
    pub fn chunks(&self) -> Vec<Chunk> {
        self.snapshot()
            .entries()
            .map(|entry| entry.chunk.clone())
            .collect()
    }

    /// Chunks of one kind, most important first, then insertion order
    #[must_use]
    pub fn search_by_kind(&self, kind: ChunkKind, limit: usize) -> Vec<Chunk> {
        let generation = self.snapshot();
        let mut matches: Vec<(usize, &StoredChunk)> = generation
            .entries()
            .enumerate()
            .filter(|(_, entry)| entry.chunk.kind() == kind)
            .collect();
        matches.sort_by(|a, b| {
            b.1.chunk
                .importance()
                .total_cmp(&a.1.chunk.importance())
                .then_with(|| a.0.cmp(&b.0))
        });
        matches
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.chunk.clone())
            .collect()
    }

    /// Every chunk of one file ordered by start line
    #[must_use]
    pub fn search_by_path(&self, source_path: &str) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = self
            .snapshot()
            .entries()
            .filter(|entry| entry.chunk.source_path == source_path)
            .map(|entry| entry.chunk.clone())
            .collect();
        chunks.sort_by_key(|chunk| (chunk.start_line, chunk.end_line));
        chunks
    }

    /// Sparse vector of arbitrary text against the current corpus statistics
    #[must_use]
    pub fn sparse_query(&self, text: &str) -> SparseVector {
        self.snapshot().stats.sparse_vector(text)
    }

    /// Score every chunk by `dense_weight · cosine + (1 − dense_weight) · sparse dot`.
    ///
    /// An empty `sparse_query` is derived from `query_text`; an empty or all-zero `dense_query`
    /// means lexical-only retrieval. Ties break by importance, then insertion order.
    pub fn hybrid_search(
        &self,
        query_text: &str,
        dense_query: &[f32],
        sparse_query: &SparseVector,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let generation = self.snapshot();

        if !dense_query.iter().all(|v| v.is_finite()) {
            return Err(VectorStoreError::NonFiniteVector("query".to_string()));
        }
        let has_dense = dense_query.iter().any(|v| *v != 0.0);
        if has_dense {
            if let Some(expected) = generation.dimension {
                if expected != dense_query.len() {
                    return Err(VectorStoreError::InvalidDimension {
                        expected,
                        actual: dense_query.len(),
                    });
                }
            }
        }

        let derived;
        let sparse_query = if sparse_query.is_empty() {
            derived = generation.stats.sparse_vector(query_text);
            &derived
        } else {
            sparse_query
        };

        let mut scored: Vec<(usize, SearchHit)> = generation
            .entries()
            .enumerate()
            .map(|(seq, entry)| {
                let dense_score = if has_dense {
                    cosine(dense_query, &entry.dense)
                } else {
                    0.0
                };
                let sparse_score = sparse_query.dot(&entry.sparse);
                let hit = SearchHit {
                    chunk: entry.chunk.clone(),
                    score: self.weights.combine(dense_score, sparse_score),
                    dense_score,
                    sparse_score,
                };
                (seq, hit)
            })
            .collect();

        scored.sort_by(compare_hits);
        scored.truncate(limit);

        log::debug!(
            "Hybrid search over {} chunks returned {} hits",
            generation.entries.len(),
            scored.len()
        );
        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    /// Persist the current generation (temp file + atomic rename)
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let generation = self.snapshot();
        PersistedIndex::from_generation(&generation)
            .save(path.as_ref())
            .await
    }

    /// Load a persisted store
    pub async fn load(path: impl AsRef<Path>, weights: HybridWeights) -> Result<Self> {
        let path = path.as_ref();
        let persisted = PersistedIndex::load(path).await?;
        let store = Self::new(weights)?;
        let generation = Generation::build(persisted.chunks, persisted.stats)
            .map_err(|e| VectorStoreError::corrupt_index(path, e))?;
        if let (Some(declared), Some(actual)) = (persisted.dimension, generation.dimension) {
            if declared != actual {
                return Err(VectorStoreError::corrupt_index(
                    path,
                    format!("declared dimension {declared} but vectors have {actual}"),
                ));
            }
        }
        log::info!(
            "Loaded {} chunks from {}",
            generation.entries.len(),
            path.display()
        );
        store.swap(generation);
        Ok(store)
    }
}

fn compare_hits(a: &(usize, SearchHit), b: &(usize, SearchHit)) -> Ordering {
    b.1.score
        .total_cmp(&a.1.score)
        .then_with(|| b.1.chunk.importance().total_cmp(&a.1.chunk.importance()))
        .then_with(|| a.0.cmp(&b.0))
}

/// Cosine similarity; zero when either side has zero norm or lengths differ
#[must_use]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
