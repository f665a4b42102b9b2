use crate::error::{LexicalError, Result};
use crate::sparse::SparseVector;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// BM25 free parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f32,
    /// Length normalization in `[0, 1]`
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(LexicalError::InvalidParams(format!(
                "k1 must be >= 0, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(LexicalError::InvalidParams(format!(
                "b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// Aggregate term statistics of one corpus generation.
///
/// This is the part of the index persisted with the vector store; it is enough to weight any
/// text against the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub doc_count: usize,
    pub avg_doc_len: f32,
    pub doc_freq: BTreeMap<String, usize>,
    #[serde(default)]
    pub params: Bm25Params,
}

impl CorpusStats {
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.doc_freq.len()
    }

    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.doc_freq.contains_key(term)
    }

    /// `ln((N − df + 0.5) / (df + 0.5))`; may be negative for very common terms
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.doc_count as f32;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f32;
        ((n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Saturated, length-normalized term frequency
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tf_component(&self, tf: u32, doc_len: usize) -> f32 {
        if tf == 0 || self.avg_doc_len <= 0.0 {
            return 0.0;
        }
        let tf = tf as f32;
        let Bm25Params { k1, b } = self.params;
        let norm = 1.0 - b + b * doc_len as f32 / self.avg_doc_len;
        tf * (k1 + 1.0) / (tf + k1 * norm)
    }

    /// Weight arbitrary text against the corpus.
    ///
    /// Out-of-vocabulary terms and terms with non-positive idf are omitted; the result is
    /// L2-normalized.
    #[must_use]
    pub fn sparse_vector(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        self.sparse_from_counts(&term_counts(&tokens), tokens.len())
    }

    fn sparse_from_counts(&self, counts: &HashMap<String, u32>, len: usize) -> SparseVector {
        if self.doc_count == 0 {
            return SparseVector::new();
        }
        counts
            .iter()
            .filter(|(term, _)| self.contains(term))
            .map(|(term, &tf)| {
                let weight = self.idf(term).max(0.0) * self.tf_component(tf, len);
                (term.clone(), weight)
            })
            .collect::<SparseVector>()
            .normalized()
    }
}

#[derive(Debug, Clone)]
struct DocTerms {
    tf: HashMap<String, u32>,
    len: usize,
}

fn term_counts(tokens: &[String]) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    counts
}

/// BM25 index over an ordered document list
#[derive(Debug, Clone)]
pub struct Bm25Index {
    stats: CorpusStats,
    docs: Vec<DocTerms>,
}

impl Bm25Index {
    /// Build statistics over the documents in order
    pub fn build<I, S>(documents: I, params: Bm25Params) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        params.validate()?;

        let docs: Vec<DocTerms> = documents
            .into_iter()
            .map(|doc| {
                let tokens = tokenize(doc.as_ref());
                DocTerms {
                    tf: term_counts(&tokens),
                    len: tokens.len(),
                }
            })
            .collect();

        let mut doc_freq = BTreeMap::new();
        for doc in &docs {
            for term in doc.tf.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let total_len: usize = docs.iter().map(|d| d.len).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            total_len as f32 / docs.len() as f32
        };

        log::debug!(
            "BM25 index built: {} docs, {} terms, avg len {:.2}",
            docs.len(),
            doc_freq.len(),
            avg_doc_len
        );

        Ok(Self {
            stats: CorpusStats {
                doc_count: docs.len(),
                avg_doc_len,
                doc_freq,
                params,
            },
            docs,
        })
    }

    #[must_use]
    pub const fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    #[must_use]
    pub fn into_stats(self) -> CorpusStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Token count of a document
    pub fn doc_len(&self, doc: usize) -> Result<usize> {
        self.doc(doc).map(|d| d.len)
    }

    fn doc(&self, index: usize) -> Result<&DocTerms> {
        self.docs.get(index).ok_or(LexicalError::DocumentOutOfRange {
            index,
            len: self.docs.len(),
        })
    }

    /// BM25 score of one document for a query; each distinct query term counts once
    pub fn score(&self, query: &str, doc: usize) -> Result<f32> {
        let doc = self.doc(doc)?;
        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();
        Ok(self.score_terms(&terms, doc))
    }

    fn score_terms(&self, terms: &BTreeSet<String>, doc: &DocTerms) -> f32 {
        terms
            .iter()
            .filter_map(|term| {
                let tf = *doc.tf.get(term)?;
                Some(self.stats.idf(term) * self.stats.tf_component(tf, doc.len))
            })
            .sum()
    }

    /// Scores for every document, in document order
    #[must_use]
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();
        self.docs
            .iter()
            .map(|doc| self.score_terms(&terms, doc))
            .collect()
    }

    /// Highest-scoring documents (positive scores only), ties by document order
    #[must_use]
    pub fn top_k(&self, query: &str, k: usize) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }

    /// Sparse vector of an indexed document (same weighting as [`CorpusStats::sparse_vector`])
    pub fn doc_sparse_vector(&self, doc: usize) -> Result<SparseVector> {
        let doc = self.doc(doc)?;
        Ok(self.stats.sparse_from_counts(&doc.tf, doc.len))
    }

    #[must_use]
    pub fn sparse_vector(&self, text: &str) -> SparseVector {
        self.stats.sparse_vector(text)
    }
}
