use crate::config::QueryConfig;
use crate::error::{Result, SearchError};
use crate::intent::{IntentClassifier, QueryIntent, SessionContext};
use crate::relevance::{RankedChunk, RelevanceScorer};
use crate::rewrite::{rewrite_query, QueryRewrite};
use codeqa_provider::{Capabilities, TokenUsage};
use codeqa_vector_store::VectorStore;
use serde::Serialize;
use std::sync::Arc;

/// Ranked context for one question; the caller composes the answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub intent: QueryIntent,
    pub ranked: Vec<RankedChunk>,
    pub rewrite: QueryRewrite,
    /// Generator usage spent on the rewrite, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Degradations that did not fail the query
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// classify → rewrite → embed → hybrid retrieve → planner re-rank.
///
/// Read-only against the store; any number of queries may run at once, also during a reindex.
pub struct QueryOrchestrator {
    store: Arc<VectorStore>,
    capabilities: Capabilities,
    config: QueryConfig,
}

impl QueryOrchestrator {
    pub fn new(store: Arc<VectorStore>, capabilities: Capabilities, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            capabilities,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Answer-ready context for `text`.
    ///
    /// At most `min(intent result cap, max_results)` chunks come back. Embedding failures degrade
    /// to lexical-only retrieval and are listed in `warnings`.
    pub async fn query(
        &self,
        text: &str,
        max_results: Option<usize>,
        session: &SessionContext,
    ) -> Result<QueryResponse> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if max_results == Some(0) {
            return Err(SearchError::config("max_results", "must be >= 1"));
        }
        if self.store.is_empty() {
            return Err(SearchError::IndexState(
                "index is empty; run `codeqa index` first".to_string(),
            ));
        }

        let intent = IntentClassifier::classify(text, session);
        log::debug!(
            "Classified '{text}' as {} ({:.2})",
            intent.intent,
            intent.confidence
        );

        let (rewrite, usage) = if self.config.rewrite {
            rewrite_query(&self.capabilities, text, self.config.generate_timeout()).await
        } else {
            (QueryRewrite::fallback(text, "rewrite disabled"), None)
        };

        let mut warnings = Vec::new();
        let dense = self.embed_query(rewrite.dense_text(), &mut warnings).await;
        let sparse = self.store.sparse_query(rewrite.sparse_text());

        let cap = intent.parameters.complexity.result_cap();
        let limit = max_results.map_or(cap, |max| cap.min(max));
        let pool = cap.saturating_mul(self.config.candidate_multiplier);
        let hits = self
            .store
            .hybrid_search(rewrite.sparse_text(), &dense, &sparse, pool)?;
        let candidates = hits.len();

        let ranked = RelevanceScorer::new(self.config.retrieval_weight).rank(&intent, hits, limit);
        log::info!(
            "Query '{text}': {} results from {candidates} candidates ({})",
            ranked.len(),
            if dense.is_empty() { "lexical-only" } else { "hybrid" }
        );

        Ok(QueryResponse {
            intent,
            ranked,
            rewrite,
            usage,
            warnings,
        })
    }

    /// Dense query vector, or empty (lexical-only) when embedding is unavailable
    async fn embed_query(&self, text: &str, warnings: &mut Vec<String>) -> Vec<f32> {
        match self.capabilities.embed(text, self.config.embed_timeout()).await {
            Ok(vector) => match self.store.dimension() {
                Some(expected) if expected != vector.len() => {
                    let warning = format!(
                        "query embedding has dimension {}, index has {expected}; using lexical-only retrieval",
                        vector.len()
                    );
                    log::warn!("{warning}");
                    warnings.push(warning);
                    Vec::new()
                }
                _ => vector,
            },
            Err(err) => {
                let warning = format!("query embedding failed ({err}); using lexical-only retrieval");
                log::warn!("{warning}");
                warnings.push(warning);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentType;
    use async_trait::async_trait;
    use codeqa_chunker::{Chunk, ChunkDetail, ChunkMetadata};
    use codeqa_lexical::{Bm25Index, Bm25Params};
    use codeqa_provider::{EmbeddingProvider, ProviderError, StubEmbedder};
    use codeqa_vector_store::StoredChunk;
    use pretty_assertions::assert_eq;

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        fn name(&self) -> &str {
            "down"
        }

        async fn embed(&self, _text: &str) -> codeqa_provider::Result<Vec<f32>> {
            Err(ProviderError::request("down", "connection refused"))
        }
    }

    fn function(path: &str, symbol: &str, body: &str) -> Chunk {
        Chunk::new(
            path,
            1,
            3,
            body.to_string(),
            ChunkMetadata::new(
                "rust",
                ChunkDetail::Function {
                    symbol: symbol.to_string(),
                    complexity: 1,
                },
            ),
        )
    }

    fn store_with(chunks: Vec<Chunk>, embedder: &StubEmbedder) -> Arc<VectorStore> {
        let index = Bm25Index::build(chunks.iter().map(|c| c.content.as_str()), Bm25Params::default())
            .unwrap();
        let entries = chunks
            .into_iter()
            .enumerate()
            .map(|(doc, chunk)| {
                let dense = embedder.embed_text(&chunk.content);
                StoredChunk::new(chunk, dense, index.doc_sparse_vector(doc).unwrap())
            })
            .collect();
        let store = VectorStore::default();
        store.replace_all(entries, index.into_stats()).unwrap();
        Arc::new(store)
    }

    fn corpus(embedder: &StubEmbedder) -> Arc<VectorStore> {
        store_with(
            vec![
                function("src/auth.rs", "login", "fn login(user: &str) { verify_password(user) }"),
                function("src/render.rs", "render", "fn render(page: &Page) { draw(page) }"),
                function("src/db.rs", "connect", "fn connect(url: &str) { open_pool(url) }"),
            ],
            embedder,
        )
    }

    fn orchestrator(store: Arc<VectorStore>, caps: Capabilities) -> QueryOrchestrator {
        QueryOrchestrator::new(store, caps, QueryConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn finds_the_named_function() {
        let embedder = StubEmbedder::new(32).unwrap();
        let caps = Capabilities::new().with_embedder(Arc::new(embedder.clone()));
        let queries = orchestrator(corpus(&embedder), caps);

        let response = queries
            .query("find the login function", None, &SessionContext::default())
            .await
            .unwrap();
        assert_eq!(response.intent.intent, IntentType::CodeSearch);
        assert_eq!(response.ranked[0].chunk.symbol_name(), Some("login"));
        assert!(response.warnings.is_empty());
        assert!(!response.rewrite.is_rewritten());
        assert_eq!(response.usage, None);
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_lexical() {
        let embedder = StubEmbedder::new(32).unwrap();
        let caps = Capabilities::new().with_embedder(Arc::new(DownEmbedder));
        let queries = orchestrator(corpus(&embedder), caps);

        let response = queries
            .query("where is login", None, &SessionContext::default())
            .await
            .unwrap();
        assert_eq!(response.ranked[0].chunk.symbol_name(), Some("login"));
        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("lexical-only"));
    }

    #[tokio::test]
    async fn dimension_mismatch_degrades_to_lexical() {
        let indexed_with = StubEmbedder::new(32).unwrap();
        let caps = Capabilities::new().with_embedder(Arc::new(StubEmbedder::new(8).unwrap()));
        let queries = orchestrator(corpus(&indexed_with), caps);

        let response = queries
            .query("where is login", None, &SessionContext::default())
            .await
            .unwrap();
        assert!(response.warnings[0].contains("dimension 8"));
        assert_eq!(response.ranked[0].chunk.symbol_name(), Some("login"));
    }

    #[tokio::test]
    async fn empty_query_and_empty_index_are_errors() {
        let embedder = StubEmbedder::new(32).unwrap();
        let caps = Capabilities::new().with_embedder(Arc::new(embedder.clone()));
        let queries = orchestrator(corpus(&embedder), caps.clone());
        let err = queries
            .query("   ", None, &SessionContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EmptyQuery));

        let empty = orchestrator(Arc::new(VectorStore::default()), caps);
        let err = empty
            .query("where is login", None, &SessionContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::IndexState(_)));
    }

    #[tokio::test]
    async fn max_results_caps_the_response() {
        let embedder = StubEmbedder::new(32).unwrap();
        let chunks = (0..12)
            .map(|i| function(&format!("src/login_{i}.rs"), "login", "fn login() { check() }"))
            .collect();
        let caps = Capabilities::new().with_embedder(Arc::new(embedder.clone()));
        let queries = orchestrator(store_with(chunks, &embedder), caps);

        let response = queries
            .query("find the login function", Some(2), &SessionContext::default())
            .await
            .unwrap();
        assert_eq!(response.ranked.len(), 2);

        let response = queries
            .query("find the login function", None, &SessionContext::default())
            .await
            .unwrap();
        assert_eq!(
            response.ranked.len(),
            response.intent.parameters.complexity.result_cap().min(12)
        );

        let err = queries
            .query("find the login function", Some(0), &SessionContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }
}
