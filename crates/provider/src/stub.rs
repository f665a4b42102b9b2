use crate::capability::EmbeddingProvider;
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use codeqa_lexical::tokenize;

/// Default dimension of the offline embedder
pub const DEFAULT_STUB_DIMENSION: usize = 256;

/// Deterministic offline embedder.
///
/// Tokens are feature-hashed into signed buckets, so texts sharing vocabulary land close to each
/// other. Text without any token falls back to a hash-seeded pseudo-random unit vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(ProviderError::InvalidConfig(
                "embedding dimension must be > 0".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        let mut hashed_any = false;

        for token in tokenize(text) {
            let mut state = fnv1a_64(token.as_bytes());
            let bucket = bucket_index(state, self.dimension);
            let sign = if splitmix64(&mut state) >> 63 == 0 {
                1.0
            } else {
                -1.0
            };
            vec[bucket] += sign;
            hashed_any = true;
        }

        if !hashed_any {
            return pseudo_random_unit(text, self.dimension);
        }
        normalize(&mut vec);
        vec
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_STUB_DIMENSION,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn name(&self) -> &str {
        "stub"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn bucket_index(hash: u64, dimension: usize) -> usize {
    (hash % dimension as u64) as usize
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vec.iter_mut() {
            *value /= norm;
        }
    }
}

fn pseudo_random_unit(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn deterministic_unit_vectors() {
        let embedder = StubEmbedder::new(64).unwrap();
        let a = embedder.embed_text("user login handler");
        let b = embedder.embed_text("user login handler");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_vocabulary_is_closer() {
        let embedder = StubEmbedder::default();
        let query = embedder.embed_text("login user");
        let related = embedder.embed_text("fn login(user: &User) -> Session");
        let unrelated = embedder.embed_text("render chart axis colors");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn tokenless_text_still_embeds() {
        let embedder = StubEmbedder::new(16).unwrap();
        let v = embedder.embed_text("{}");
        assert_eq!(v.len(), 16);
        assert!(v.iter().any(|x| *x != 0.0));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(StubEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn implements_embedding_provider() {
        let embedder = StubEmbedder::new(8).unwrap();
        let v = embedder.embed("hello world").await.unwrap();
        assert_eq!(v, embedder.embed_text("hello world"));
        assert_eq!(embedder.dimension(), Some(8));
    }
}
