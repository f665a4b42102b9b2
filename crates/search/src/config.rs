use crate::error::{Result, SearchError};
use codeqa_chunker::ChunkerConfig;
use codeqa_indexer::IndexingConfig;
use codeqa_lexical::Bm25Params;
use codeqa_provider::ProviderConfig;
use codeqa_vector_store::HybridWeights;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

/// Per-project config file looked up at the project root
pub const CONFIG_FILE_NAME: &str = ".codeqa.toml";

pub const BATCH_SIZE_ENV: &str = "CODEQA_BATCH_SIZE";

/// `[query]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Ask the generator for dense/sparse rewrites when one is configured
    pub rewrite: bool,
    /// Hybrid candidates fetched per final result
    pub candidate_multiplier: usize,
    /// Weight of the hybrid score inside the planner's relevance
    pub retrieval_weight: f32,
    pub embed_timeout_ms: u64,
    pub generate_timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            rewrite: true,
            candidate_multiplier: 4,
            retrieval_weight: 1.0,
            embed_timeout_ms: 10_000,
            generate_timeout_ms: 20_000,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub const fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    #[must_use]
    pub const fn generate_timeout(&self) -> Duration {
        Duration::from_millis(self.generate_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.candidate_multiplier == 0 {
            return Err(SearchError::config(
                "query.candidate_multiplier",
                "must be >= 1",
            ));
        }
        if !self.retrieval_weight.is_finite() || self.retrieval_weight < 0.0 {
            return Err(SearchError::config(
                "query.retrieval_weight",
                "must be a finite, non-negative number",
            ));
        }
        if self.embed_timeout_ms == 0 {
            return Err(SearchError::config("query.embed_timeout_ms", "must be > 0"));
        }
        if self.generate_timeout_ms == 0 {
            return Err(SearchError::config(
                "query.generate_timeout_ms",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// Everything tunable about one engine, one TOML section per component
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chunker: ChunkerConfig,
    pub lexical: Bm25Params,
    pub hybrid: HybridWeights,
    pub indexing: IndexingConfig,
    pub query: QueryConfig,
    pub provider: ProviderConfig,
}

impl EngineConfig {
    /// Load `explicit`, or `<root>/.codeqa.toml` when present, then apply process env overrides.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(root, explicit, |key| std::env::var(key).ok())
    }

    /// [`EngineConfig::load`] with a custom environment lookup
    pub fn load_with(
        root: &Path,
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = root.join(CONFIG_FILE_NAME);
                match std::fs::read_to_string(&path) {
                    Ok(text) => Self::from_toml(&text, &path)?,
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        log::debug!("No {CONFIG_FILE_NAME} under {}, using defaults", root.display());
                        Self::default()
                    }
                    Err(err) => {
                        return Err(SearchError::config(
                            CONFIG_FILE_NAME,
                            format!("read {}: {err}", path.display()),
                        ))
                    }
                }
            }
        };
        config.apply_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| SearchError::config("config", format!("read {}: {err}", path.display())))?;
        Self::from_toml(&text, path)
    }

    fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text)
            .map_err(|err| SearchError::config("config", format!("parse {}: {err}", path.display())))
    }

    /// `CODEQA_EMBEDDING_MODE`, `CODEQA_EMBEDDING_DIM`, `CODEQA_BATCH_SIZE`
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.provider
            .apply_overrides(env(ProviderConfig::MODE_ENV), env(ProviderConfig::DIM_ENV))
            .map_err(|err| SearchError::config("provider", err))?;
        if let Some(batch) = env(BATCH_SIZE_ENV) {
            self.indexing.batch_size = batch.trim().parse().map_err(|_| {
                SearchError::config(BATCH_SIZE_ENV, "must be a positive integer")
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.chunker
            .validate()
            .map_err(|err| SearchError::config("chunker", err))?;
        self.lexical
            .validate()
            .map_err(|err| SearchError::config("lexical", err))?;
        self.hybrid
            .validate()
            .map_err(|err| SearchError::config("hybrid", err))?;
        self.indexing
            .validate()
            .map_err(|err| SearchError::Configuration(err.to_string()))?;
        self.query.validate()?;
        self.provider
            .validate()
            .map_err(|err| SearchError::Configuration(err.to_string()))?;
        Ok(())
    }
}
