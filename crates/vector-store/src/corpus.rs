use crate::error::{Result, VectorStoreError};
use crate::store::Generation;
use crate::types::StoredChunk;
use codeqa_lexical::CorpusStats;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// On-disk form of one corpus generation
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedIndex {
    pub schema_version: u32,
    pub dimension: Option<usize>,
    pub stats: CorpusStats,
    pub chunks: Vec<StoredChunk>,
}

impl PersistedIndex {
    pub(crate) fn from_generation(generation: &Generation) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            dimension: generation.dimension(),
            stats: generation.stats().clone(),
            chunks: generation.entries().cloned().collect(),
        }
    }

    pub(crate) async fn load(path: &Path) -> Result<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VectorStoreError::missing_index(path))
            }
            Err(e) => return Err(e.into()),
        };
        let persisted: Self = serde_json::from_slice(&bytes)
            .map_err(|e| VectorStoreError::corrupt_index(path, e))?;
        if persisted.schema_version != INDEX_SCHEMA_VERSION {
            return Err(VectorStoreError::corrupt_index(
                path,
                format!(
                    "unsupported schema_version {} (expected {INDEX_SCHEMA_VERSION})",
                    persisted.schema_version
                ),
            ));
        }
        Ok(persisted)
    }

    pub(crate) async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::debug!("Persisted {} chunks to {}", self.chunks.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{HybridWeights, StoredChunk, VectorStore, VectorStoreError};
    use codeqa_chunker::{Chunk, ChunkDetail, ChunkMetadata};
    use codeqa_lexical::{Bm25Index, Bm25Params, SparseVector};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn stored(path: &str, symbol: &str, dense: Vec<f32>) -> StoredChunk {
        let chunk = Chunk::new(
            path,
            3,
            9,
            format!("fn {symbol}() {{}}"),
            ChunkMetadata::new(
                "rust",
                ChunkDetail::Function {
                    symbol: symbol.to_string(),
                    complexity: 2,
                },
            )
            .framework(Some("axum"))
            .importance(0.75),
        );
        let sparse: SparseVector = [(symbol.to_string(), 0.5)].into_iter().collect();
        StoredChunk::new(chunk, dense, sparse)
    }

    #[tokio::test]
    async fn roundtrip_is_lossless() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".codeqa").join("index.json");

        let stats = Bm25Index::build(["alpha beta", "beta gamma"], Bm25Params::default())
            .unwrap()
            .into_stats();
        let store = VectorStore::default();
        store
            .replace_all(
                vec![
                    stored("a.rs", "alpha", vec![0.5, 0.25, -0.125]),
                    stored("b.rs", "gamma", vec![0.0, 0.0, 0.0]),
                ],
                stats.clone(),
            )
            .unwrap();
        store.save(&path).await.unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = VectorStore::load(&path, HybridWeights::default()).await.unwrap();
        assert_eq!(loaded.count(), 2);
        assert_eq!(loaded.dimension(), Some(3));
        assert_eq!(*loaded.stats(), stats);
        for chunk in store.chunks() {
            assert_eq!(loaded.get(&chunk.id), store.get(&chunk.id));
        }
    }

    #[tokio::test]
    async fn missing_and_corrupt_files_are_index_state_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("none.json");
        let err = VectorStore::load(&missing, HybridWeights::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::IndexState(ref msg) if msg.contains("codeqa index")));

        let corrupt = tmp.path().join("corrupt.json");
        std::fs::write(&corrupt, b"{ not json").unwrap();
        let err = VectorStore::load(&corrupt, HybridWeights::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::IndexState(_)));

        let future = tmp.path().join("future.json");
        std::fs::write(
            &future,
            br#"{"schema_version":99,"dimension":null,"stats":{"doc_count":0,"avg_doc_len":0.0,"doc_freq":{}},"chunks":[]}"#,
        )
        .unwrap();
        let err = VectorStore::load(&future, HybridWeights::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::IndexState(ref msg) if msg.contains("schema_version")));
    }
}
