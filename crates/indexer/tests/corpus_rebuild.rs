use async_trait::async_trait;
use codeqa_chunker::ChunkKind;
use codeqa_indexer::{
    IndexPhase, IndexProgress, IndexerError, IndexingConfig, IndexingOrchestrator, ProgressSink,
};
use codeqa_provider::{Capabilities, EmbeddingProvider, ProviderError, StubEmbedder};
use codeqa_vector_store::{HybridWeights, VectorStore};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const DIM: usize = 32;

/// Stub embedder that fails for any text containing `marker`
struct FlakyEmbedder {
    inner: StubEmbedder,
    marker: &'static str,
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn embed(&self, text: &str) -> codeqa_provider::Result<Vec<f32>> {
        if text.contains(self.marker) {
            return Err(ProviderError::request("flaky", "scripted failure"));
        }
        self.inner.embed(text).await
    }
}

/// Stub embedder that corrupts the vector of any text containing `marker`
struct NanEmbedder {
    inner: StubEmbedder,
    marker: &'static str,
}

#[async_trait]
impl EmbeddingProvider for NanEmbedder {
    fn name(&self) -> &str {
        "nan"
    }

    async fn embed(&self, text: &str) -> codeqa_provider::Result<Vec<f32>> {
        let mut vector = self.inner.embed(text).await?;
        if text.contains(self.marker) {
            vector[0] = f32::NAN;
        }
        Ok(vector)
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<IndexProgress>>,
}

impl RecordingProgress {
    fn events(&self) -> Vec<IndexProgress> {
        self.events.lock().unwrap().clone()
    }

    fn phases(&self) -> Vec<IndexPhase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                IndexProgress::Phase { phase } => Some(phase),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, progress: IndexProgress) {
        self.events.lock().unwrap().push(progress);
    }
}

fn stub_caps() -> Capabilities {
    Capabilities::new().with_embedder(Arc::new(StubEmbedder::new(DIM).unwrap()))
}

fn fast_config(batch_size: usize) -> IndexingConfig {
    IndexingConfig {
        batch_size,
        batch_delay_ms: 0,
        ..IndexingConfig::default()
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn toy_repo(root: &Path) {
    write(
        root,
        "src/user.rs",
        "pub struct User {\n    name: String,\n}\n\nimpl User {\n    pub fn greet(&self) -> String {\n        format!(\"hi {}\", self.name)\n    }\n}\n",
    );
    write(
        root,
        "src/login.py",
        "def login(user, password):\n    if not password:\n        return None\n    return user\n",
    );
    write(root, "docs/notes.txt", "Login flow notes for the user service.\n");
}

fn orchestrator(root: &Path, caps: Capabilities, store: Arc<VectorStore>) -> IndexingOrchestrator {
    IndexingOrchestrator::new(root, caps, store)
        .unwrap()
        .with_config(fast_config(10))
        .unwrap()
}

#[tokio::test]
async fn one_failed_embedding_degrades_one_chunk() {
    let temp = TempDir::new().unwrap();
    for i in 0..10 {
        let body = if i == 7 { "this one is broken" } else { "plain note" };
        write(temp.path(), &format!("notes/note{i}.txt"), &format!("{body} {i}\n"));
    }

    let caps = Capabilities::new().with_embedder(Arc::new(FlakyEmbedder {
        inner: StubEmbedder::new(DIM).unwrap(),
        marker: "broken",
    }));
    let store = Arc::new(VectorStore::default());
    let report = orchestrator(temp.path(), caps, Arc::clone(&store))
        .index()
        .await
        .unwrap();

    assert_eq!(report.files, 10);
    assert_eq!(report.total_chunks, 10);
    assert_eq!(report.embedded, 9);
    assert_eq!(report.provider_errors, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.summary(), "indexed 9/10 chunks, 1 embedding failures");

    assert_eq!(store.count(), 10);
    assert_eq!(store.dimension(), Some(DIM));
    let placeholders: Vec<_> = store
        .chunks()
        .into_iter()
        .filter_map(|chunk| store.get(&chunk.id))
        .filter(|entry| entry.is_placeholder())
        .collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].dense.len(), DIM);
    assert_eq!(placeholders[0].chunk.source_path, "notes/note7.txt");
}

#[tokio::test]
async fn non_finite_embedding_becomes_placeholder() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "notes/good.txt", "login flow for the user service\n");
    write(temp.path(), "notes/bad.txt", "corrupted login notes\n");
    write(temp.path(), "notes/other.txt", "unrelated deployment checklist\n");

    let caps = Capabilities::new().with_embedder(Arc::new(NanEmbedder {
        inner: StubEmbedder::new(DIM).unwrap(),
        marker: "corrupted",
    }));
    let store = Arc::new(VectorStore::default());
    let indexer = orchestrator(temp.path(), caps, Arc::clone(&store));
    let report = indexer.index().await.unwrap();

    assert_eq!(report.total_chunks, 3);
    assert_eq!(report.embedded, 2);
    assert_eq!(report.provider_errors, 1);
    for chunk in store.chunks() {
        let entry = store.get(&chunk.id).unwrap();
        assert!(entry.is_finite());
        assert_eq!(entry.is_placeholder(), chunk.source_path == "notes/bad.txt");
    }

    let loaded = VectorStore::load(indexer.index_path(), HybridWeights::default())
        .await
        .unwrap();
    assert_eq!(loaded.count(), 3);

    let query = StubEmbedder::new(DIM).unwrap().embed("login").await.unwrap();
    let hits = loaded
        .hybrid_search("login", &query, &loaded.sparse_query("login"), 3)
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|hit| hit.score.is_finite()));
}

#[tokio::test]
async fn empty_tree_completes_with_zero_chunks() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(VectorStore::default());
    let indexer = orchestrator(temp.path(), stub_caps(), Arc::clone(&store));

    let report = indexer.index().await.unwrap();
    assert_eq!(report.total_chunks, 0);
    assert_eq!(report.files, 0);
    assert!(store.is_empty());
    assert!(indexer.index_path().exists());
    assert_eq!(indexer.phase(), IndexPhase::Idle);
}

#[tokio::test]
async fn reindexing_unchanged_tree_is_idempotent() {
    let temp = TempDir::new().unwrap();
    toy_repo(temp.path());
    let store = Arc::new(VectorStore::default());
    let indexer = orchestrator(temp.path(), stub_caps(), Arc::clone(&store));

    let first_report = indexer.index().await.unwrap();
    let first: BTreeSet<(String, String)> = store
        .chunks()
        .into_iter()
        .map(|c| (c.id.as_str().to_string(), c.content))
        .collect();

    let second_report = indexer.index().await.unwrap();
    let second: BTreeSet<(String, String)> = store
        .chunks()
        .into_iter()
        .map(|c| (c.id.as_str().to_string(), c.content))
        .collect();

    assert_eq!(first, second);
    assert_eq!(first_report.chunks_by_kind, second_report.chunks_by_kind);
    assert!(first_report.chunks_by_kind.get(&ChunkKind::Class).copied().unwrap_or(0) >= 1);
    assert!(first_report.chunks_by_kind.get(&ChunkKind::Function).copied().unwrap_or(0) >= 2);
}

#[tokio::test]
async fn persisted_index_reloads() {
    let temp = TempDir::new().unwrap();
    toy_repo(temp.path());
    let store = Arc::new(VectorStore::default());
    let indexer = orchestrator(temp.path(), stub_caps(), Arc::clone(&store));
    indexer.index().await.unwrap();

    let loaded = VectorStore::load(indexer.index_path(), HybridWeights::default())
        .await
        .unwrap();
    assert_eq!(loaded.count(), store.count());
    assert_eq!(*loaded.stats(), *store.stats());
    for chunk in store.chunks() {
        assert_eq!(loaded.get(&chunk.id), store.get(&chunk.id));
    }
}

#[tokio::test]
async fn missing_embedder_fails_before_touching_the_index() {
    let temp = TempDir::new().unwrap();
    toy_repo(temp.path());
    let store = Arc::new(VectorStore::default());
    let indexer = orchestrator(temp.path(), stub_caps(), Arc::clone(&store));
    indexer.index().await.unwrap();
    let count = store.count();
    let persisted = std::fs::read(indexer.index_path()).unwrap();

    write(temp.path(), "src/extra.rs", "pub fn extra() {}\n");
    let without_embedder = orchestrator(temp.path(), Capabilities::new(), Arc::clone(&store));
    let err = without_embedder.index().await.unwrap_err();

    assert!(matches!(err, IndexerError::Configuration(_)));
    assert_eq!(without_embedder.phase(), IndexPhase::Failed);
    assert_eq!(store.count(), count);
    assert_eq!(std::fs::read(indexer.index_path()).unwrap(), persisted);
}

#[tokio::test]
async fn milestones_cover_every_phase_and_batch() {
    let temp = TempDir::new().unwrap();
    for i in 0..10 {
        write(temp.path(), &format!("n{i}.txt"), &format!("note number {i}\n"));
    }
    let progress = Arc::new(RecordingProgress::default());
    let indexer = IndexingOrchestrator::new(temp.path(), stub_caps(), Arc::default())
        .unwrap()
        .with_config(fast_config(4))
        .unwrap()
        .with_progress(Arc::clone(&progress) as Arc<dyn ProgressSink>);
    indexer.index().await.unwrap();

    assert_eq!(
        progress.phases(),
        vec![
            IndexPhase::Discovering,
            IndexPhase::Chunking,
            IndexPhase::LexicalIndexBuild,
            IndexPhase::EmbeddingBatch,
            IndexPhase::VectorStoreSwap,
            IndexPhase::Idle,
        ]
    );
    let batches: Vec<(usize, usize, usize)> = progress
        .events()
        .into_iter()
        .filter_map(|event| match event {
            IndexProgress::Batch {
                batch,
                batches,
                embedded,
            } => Some((batch, batches, embedded)),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![(1, 3, 4), (2, 3, 8), (3, 3, 10)]);
}

#[tokio::test]
async fn concurrent_reindexes_are_serialized() {
    let temp = TempDir::new().unwrap();
    toy_repo(temp.path());
    let progress = Arc::new(RecordingProgress::default());
    let indexer = Arc::new(
        IndexingOrchestrator::new(temp.path(), stub_caps(), Arc::default())
            .unwrap()
            .with_config(fast_config(1))
            .unwrap()
            .with_progress(Arc::clone(&progress) as Arc<dyn ProgressSink>),
    );

    let a = tokio::spawn({
        let indexer = Arc::clone(&indexer);
        async move { indexer.index().await }
    });
    let b = tokio::spawn({
        let indexer = Arc::clone(&indexer);
        async move { indexer.index().await }
    });
    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
    assert_eq!(a.total_chunks, b.total_chunks);

    let phases = progress.phases();
    let one_run = [
        IndexPhase::Discovering,
        IndexPhase::Chunking,
        IndexPhase::LexicalIndexBuild,
        IndexPhase::EmbeddingBatch,
        IndexPhase::VectorStoreSwap,
        IndexPhase::Idle,
    ];
    let expected: Vec<IndexPhase> = one_run.iter().chain(one_run.iter()).copied().collect();
    assert_eq!(phases, expected);
}

#[tokio::test]
async fn invalid_settings_are_rejected_up_front() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");
    assert!(matches!(
        IndexingOrchestrator::new(&missing, stub_caps(), Arc::default()),
        Err(IndexerError::InvalidPath(_))
    ));

    let err = IndexingOrchestrator::new(temp.path(), stub_caps(), Arc::default())
        .unwrap()
        .with_config(fast_config(0))
        .err()
        .unwrap();
    assert!(matches!(err, IndexerError::Configuration(_)));
}
