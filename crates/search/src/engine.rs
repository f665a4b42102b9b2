use crate::config::EngineConfig;
use crate::error::{Result, SearchError};
use crate::intent::{IntentClassifier, QueryIntent, SessionContext};
use crate::query::{QueryOrchestrator, QueryResponse};
use codeqa_indexer::{IndexPhase, IndexReport, IndexingOrchestrator, ProgressSink};
use codeqa_provider::Capabilities;
use codeqa_vector_store::{index_path_for_project_root, VectorStore, VectorStoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One project's retrieval engine: a shared store, the indexing pipeline and the query pipeline
pub struct RetrievalEngine {
    root: PathBuf,
    config: EngineConfig,
    capabilities: Capabilities,
    store: Arc<VectorStore>,
    indexer: IndexingOrchestrator,
    queries: QueryOrchestrator,
}

impl RetrievalEngine {
    /// Engine over an empty store; nothing is read from disk
    pub fn new(root: impl AsRef<Path>, config: EngineConfig, capabilities: Capabilities) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(VectorStore::new(config.hybrid)?);
        Self::assemble(root.as_ref(), config, capabilities, store)
    }

    /// Engine over the persisted index of `root`, if there is one.
    ///
    /// A missing index yields an empty store; a corrupt or unsupported one is an error.
    pub async fn open(
        root: impl AsRef<Path>,
        config: EngineConfig,
        capabilities: Capabilities,
    ) -> Result<Self> {
        config.validate()?;
        let root = root.as_ref();
        let index_path = index_path_for_project_root(root);
        let store = if tokio::fs::try_exists(&index_path).await? {
            let store = VectorStore::load(&index_path, config.hybrid)
                .await
                .map_err(|err| match err {
                    VectorStoreError::IndexState(msg) => SearchError::IndexState(msg),
                    other => other.into(),
                })?;
            log::info!(
                "Loaded {} chunks from {}",
                store.count(),
                index_path.display()
            );
            store
        } else {
            log::debug!("No index at {}", index_path.display());
            VectorStore::new(config.hybrid)?
        };
        Self::assemble(root, config, capabilities, Arc::new(store))
    }

    fn assemble(
        root: &Path,
        config: EngineConfig,
        capabilities: Capabilities,
        store: Arc<VectorStore>,
    ) -> Result<Self> {
        let indexer = IndexingOrchestrator::new(root, capabilities.clone(), Arc::clone(&store))?
            .with_chunker_config(config.chunker.clone())?
            .with_bm25_params(config.lexical)?
            .with_config(config.indexing.clone())?;
        let queries =
            QueryOrchestrator::new(Arc::clone(&store), capabilities.clone(), config.query.clone())?;

        Ok(Self {
            root: root.to_path_buf(),
            config,
            capabilities,
            store,
            indexer,
            queries,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.indexer = self.indexer.with_progress(progress);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    #[must_use]
    pub fn phase(&self) -> IndexPhase {
        self.indexer.phase()
    }

    /// Full rebuild of the project index; see [`IndexingOrchestrator::index`]
    pub async fn index_codebase(&self) -> Result<IndexReport> {
        Ok(self.indexer.index().await?)
    }

    pub async fn query(&self, text: &str, max_results: Option<usize>) -> Result<QueryResponse> {
        self.query_with_session(text, max_results, &SessionContext::default())
            .await
    }

    pub async fn query_with_session(
        &self,
        text: &str,
        max_results: Option<usize>,
        session: &SessionContext,
    ) -> Result<QueryResponse> {
        self.queries.query(text, max_results, session).await
    }

    /// Classification only; needs no index
    #[must_use]
    pub fn classify(&self, text: &str, session: &SessionContext) -> QueryIntent {
        IntentClassifier::classify(text, session)
    }
}
