use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Term → weight map. Keys are a subset of the corpus vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVector(BTreeMap<String, f32>);

impl SparseVector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a weight; non-positive and non-finite weights are ignored.
    pub fn insert(&mut self, term: impl Into<String>, weight: f32) {
        if weight.is_finite() && weight > 0.0 {
            self.0.insert(term.into(), weight);
        }
    }

    #[must_use]
    pub fn get(&self, term: &str) -> Option<f32> {
        self.0.get(term).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(term, weight)| (term.as_str(), *weight))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn norm(&self) -> f32 {
        self.0.values().map(|w| w * w).sum::<f32>().sqrt()
    }

    /// Scale to unit length (empty vectors stay empty)
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for weight in self.0.values_mut() {
                *weight /= norm;
            }
        }
        self
    }

    /// Dot product over shared terms
    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .0
            .iter()
            .filter_map(|(term, weight)| large.0.get(term).map(|w| w * weight))
            .sum()
    }
}

impl FromIterator<(String, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (String, f32)>>(iter: I) -> Self {
        let mut vector = Self::new();
        for (term, weight) in iter {
            vector.insert(term, weight);
        }
        vector
    }
}
