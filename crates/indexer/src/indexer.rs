use crate::config::IndexingConfig;
use crate::error::{IndexerError, Result};
use crate::index_lock::acquire_index_write_lock;
use crate::progress::{IndexPhase, IndexProgress, LogProgress, ProgressSink};
use crate::stats::IndexReport;
use codeqa_chunker::{count_by_kind, Chunk, Chunker, ChunkerConfig, FileScanner};
use codeqa_lexical::{Bm25Index, Bm25Params, SparseVector};
use codeqa_provider::{Capabilities, ProviderError};
use codeqa_vector_store::{index_path_for_project_root, StoredChunk, VectorStore};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinError;

/// Full-corpus rebuild: discover → chunk → BM25 → batch-embed → swap → persist.
///
/// Rebuilds are single-flight: an in-process async mutex plus an exclusive file lock under
/// `<root>/.codeqa/` serialize them within and across processes. Queries keep reading the
/// previous generation until the swap.
pub struct IndexingOrchestrator {
    root: PathBuf,
    chunker: Chunker,
    bm25: Bm25Params,
    config: IndexingConfig,
    capabilities: Capabilities,
    store: Arc<VectorStore>,
    progress: Arc<dyn ProgressSink>,
    phase: Mutex<IndexPhase>,
    flight: tokio::sync::Mutex<()>,
}

impl IndexingOrchestrator {
    /// Create an orchestrator with default chunking, BM25 and batch settings
    pub fn new(
        root: impl AsRef<Path>,
        capabilities: Capabilities,
        store: Arc<VectorStore>,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            chunker: Chunker::new(ChunkerConfig::default())?,
            bm25: Bm25Params::default(),
            config: IndexingConfig::default(),
            capabilities,
            store,
            progress: Arc::new(LogProgress),
            phase: Mutex::new(IndexPhase::Idle),
            flight: tokio::sync::Mutex::new(()),
        })
    }

    pub fn with_chunker_config(mut self, config: ChunkerConfig) -> Result<Self> {
        self.chunker = Chunker::new(config)?;
        Ok(self)
    }

    pub fn with_bm25_params(mut self, params: Bm25Params) -> Result<Self> {
        params.validate()?;
        self.bm25 = params;
        Ok(self)
    }

    pub fn with_config(mut self, config: IndexingConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Where the corpus is persisted
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        index_path_for_project_root(&self.root)
    }

    /// Current phase; `Failed` sticks until the next successful run
    #[must_use]
    pub fn phase(&self) -> IndexPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: IndexPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
        self.progress.report(IndexProgress::Phase { phase });
    }

    /// Rebuild the whole index.
    ///
    /// Fails before touching anything when no embedding capability is configured. Per-file and
    /// per-chunk failures are counted in the report, never fatal.
    pub async fn index(&self) -> Result<IndexReport> {
        let _flight = self.flight.lock().await;

        if self.capabilities.embedder().is_none() {
            self.set_phase(IndexPhase::Failed);
            return Err(IndexerError::Configuration(
                "no embedding capability configured; indexing requires one".to_string(),
            ));
        }

        let _write_lock = acquire_index_write_lock(&self.root).await?;
        log::info!("Indexing project at {}", self.root.display());

        match self.rebuild(Instant::now()).await {
            Ok(report) => {
                self.set_phase(IndexPhase::Idle);
                log::info!("Indexing completed: {report} in {}ms", report.elapsed_ms);
                Ok(report)
            }
            Err(err) => {
                self.set_phase(IndexPhase::Failed);
                log::error!("Indexing failed: {err}");
                Err(err)
            }
        }
    }

    async fn rebuild(&self, started: Instant) -> Result<IndexReport> {
        let mut report = IndexReport::default();

        self.set_phase(IndexPhase::Discovering);
        let root = self.root.clone();
        let config = self.chunker.config().clone();
        let scan = tokio::task::spawn_blocking(move || FileScanner::new(&root, &config).scan())
            .await
            .map_err(join_error)?;
        report.files = scan.files.len();
        report.discovery_errors = scan.errors.len();
        for err in &scan.errors {
            report.add_warning(err);
        }
        self.progress.report(IndexProgress::Discovered {
            files: report.files,
        });

        self.set_phase(IndexPhase::Chunking);
        let chunker = self.chunker.clone();
        let files = scan.files;
        let tree = tokio::task::spawn_blocking(move || chunker.chunk_files(&files))
            .await
            .map_err(join_error)?;
        report.discovery_errors += tree.discovery_errors.len();
        report.extraction_errors = tree.extraction_errors.len();
        report.oversized_dropped = tree.oversized_dropped;
        for err in tree.discovery_errors.iter().chain(&tree.extraction_errors) {
            report.add_warning(err);
        }
        let chunks = tree.chunks;
        report.total_chunks = chunks.len();
        report.chunks_by_kind = count_by_kind(&chunks);
        self.progress.report(IndexProgress::Chunked {
            chunks: chunks.len(),
        });

        self.set_phase(IndexPhase::LexicalIndexBuild);
        let lexical = Bm25Index::build(chunks.iter().map(|c| c.content.as_str()), self.bm25)?;
        let sparse = (0..chunks.len())
            .map(|doc| lexical.doc_sparse_vector(doc))
            .collect::<codeqa_lexical::Result<Vec<SparseVector>>>()?;
        let stats = lexical.into_stats();

        self.set_phase(IndexPhase::EmbeddingBatch);
        let dense = self.embed_all(&chunks, &mut report).await;

        self.set_phase(IndexPhase::VectorStoreSwap);
        let entries: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(sparse)
            .zip(dense)
            .map(|((chunk, sparse), dense)| StoredChunk::new(chunk, dense, sparse))
            .collect();
        self.store.replace_all(entries, stats)?;

        let index_path = self.index_path();
        self.store.save(&index_path).await.map_err(|err| {
            IndexerError::IndexState(format!("persist {}: {err}", index_path.display()))
        })?;

        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report)
    }

    /// Embed every chunk, batch by batch. Failed chunks get a zero placeholder of the corpus
    /// dimension.
    async fn embed_all(&self, chunks: &[Chunk], report: &mut IndexReport) -> Vec<Vec<f32>> {
        let batch_size = self.config.batch_size;
        let batches = chunks.len().div_ceil(batch_size);
        let timeout = self.config.embed_timeout();
        let mut dimension: Option<usize> = None;
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(chunks.len());

        for (index, batch) in chunks.chunks(batch_size).enumerate() {
            if index > 0 && !self.config.batch_delay().is_zero() {
                tokio::time::sleep(self.config.batch_delay()).await;
            }

            let results = join_all(batch.iter().map(|chunk| {
                let text = document_text(chunk);
                async move { self.capabilities.embed(&text, timeout).await }
            }))
            .await;

            for (chunk, result) in batch.iter().zip(results) {
                match accept_vector(result, &mut dimension) {
                    Ok(vector) => {
                        report.embedded += 1;
                        vectors.push(Some(vector));
                    }
                    Err(err) => {
                        log::warn!(
                            "Embedding failed for {}:{}: {err}",
                            chunk.source_path,
                            chunk.start_line
                        );
                        report.provider_errors += 1;
                        report.add_warning(format_args!(
                            "embedding {}:{}: {err}",
                            chunk.source_path, chunk.start_line
                        ));
                        vectors.push(None);
                    }
                }
            }

            self.progress.report(IndexProgress::Batch {
                batch: index + 1,
                batches,
                embedded: report.embedded,
            });
        }

        let dimension = dimension.unwrap_or(0);
        vectors
            .into_iter()
            .map(|vector| vector.unwrap_or_else(|| vec![0.0; dimension]))
            .collect()
    }
}

/// Text handed to the embedder: a short header naming the chunk, then its content
fn document_text(chunk: &Chunk) -> String {
    match chunk.symbol_name() {
        Some(symbol) => format!(
            "{} {symbol} in {}\n{}",
            chunk.kind(),
            chunk.source_path,
            chunk.content
        ),
        None => format!("{}\n{}", chunk.source_path, chunk.content),
    }
}

/// The first accepted vector fixes the corpus dimension; non-finite vectors are rejected
fn accept_vector(
    result: codeqa_provider::Result<Vec<f32>>,
    dimension: &mut Option<usize>,
) -> codeqa_provider::Result<Vec<f32>> {
    let vector = result?;
    if vector.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "empty embedding vector".to_string(),
        ));
    }
    if !vector.iter().all(|v| v.is_finite()) {
        return Err(ProviderError::InvalidResponse(
            "embedding vector has non-finite components".to_string(),
        ));
    }
    match *dimension {
        Some(expected) if expected != vector.len() => Err(ProviderError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        _ => {
            *dimension = Some(vector.len());
            Ok(vector)
        }
    }
}

fn join_error(err: JoinError) -> IndexerError {
    IndexerError::Other(format!("join blocking task: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeqa_chunker::{ChunkDetail, ChunkMetadata};

    #[test]
    fn first_vector_fixes_dimension() {
        let mut dimension = None;
        assert!(accept_vector(Ok(vec![1.0, 0.0]), &mut dimension).is_ok());
        assert_eq!(dimension, Some(2));
        let err = accept_vector(Ok(vec![1.0]), &mut dimension).unwrap_err();
        assert_eq!(
            err,
            ProviderError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(accept_vector(Ok(Vec::new()), &mut dimension).is_err());
        assert!(matches!(
            accept_vector(Ok(vec![f32::NAN, 0.0]), &mut dimension),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(accept_vector(Ok(vec![f32::NEG_INFINITY, 0.0]), &mut dimension).is_err());
        assert!(accept_vector(Err(ProviderError::request("p", "down")), &mut dimension).is_err());
        assert_eq!(dimension, Some(2));
    }

    #[test]
    fn document_text_names_the_symbol() {
        let chunk = Chunk::new(
            "src/auth.rs",
            1,
            3,
            "fn login() {}".to_string(),
            ChunkMetadata::new(
                "rust",
                ChunkDetail::Function {
                    symbol: "login".to_string(),
                    complexity: 1,
                },
            ),
        );
        assert_eq!(
            document_text(&chunk),
            "function login in src/auth.rs\nfn login() {}"
        );
    }
}
