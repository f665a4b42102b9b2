use crate::error::{ProviderError, Result};
use crate::stub::{StubEmbedder, DEFAULT_STUB_DIMENSION};
use crate::types::{GenerateOptions, Generation, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Text → dense vector. All vectors of one provider share a dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fixed output dimension, when known up front
    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Chat-style text generation
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, messages: &[Message], options: &GenerateOptions)
        -> Result<Generation>;
}

/// The external capabilities available to the engine.
///
/// Built once and handed to both orchestrators; either capability may be absent.
#[derive(Clone, Default)]
pub struct Capabilities {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn GenerationProvider>>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("embedder", &self.embedder.as_ref().map(|e| e.name().to_string()))
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Capabilities described by a provider config (only the offline embedder is built in)
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let caps = match config.embedding_mode {
            EmbeddingMode::Stub => {
                Self::new().with_embedder(Arc::new(StubEmbedder::new(config.embedding_dim)?))
            }
            EmbeddingMode::None => Self::new(),
        };
        log::debug!("Configured capabilities: {caps:?}");
        Ok(caps)
    }

    #[must_use]
    pub fn embedder(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        self.embedder.as_ref()
    }

    #[must_use]
    pub fn generator(&self) -> Option<&Arc<dyn GenerationProvider>> {
        self.generator.as_ref()
    }

    pub fn require_embedder(&self) -> Result<&Arc<dyn EmbeddingProvider>> {
        self.embedder
            .as_ref()
            .ok_or(ProviderError::NotConfigured("embedding"))
    }

    /// Embed with a deadline
    pub async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        let embedder = self.require_embedder()?;
        with_timeout("embedding", timeout, embedder.embed(text)).await
    }

    /// Generate with a deadline
    pub async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
        timeout: Duration,
    ) -> Result<Generation> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(ProviderError::NotConfigured("generation"))?;
        with_timeout("generation", timeout, generator.generate(messages, options)).await
    }
}

async fn with_timeout<T>(
    operation: &'static str,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            operation,
            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Which built-in embedder to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Deterministic feature-hashing embedder (offline)
    #[default]
    Stub,
    /// No embedding capability; indexing fails its precondition
    None,
}

impl EmbeddingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::None => "none",
        }
    }
}

impl FromStr for EmbeddingMode {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "none" | "off" => Ok(Self::None),
            other => Err(ProviderError::InvalidConfig(format!(
                "unsupported embedding mode '{other}' (expected 'stub' or 'none')"
            ))),
        }
    }
}

/// `[provider]` section of the engine config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub embedding_mode: EmbeddingMode,
    pub embedding_dim: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            embedding_mode: EmbeddingMode::default(),
            embedding_dim: DEFAULT_STUB_DIMENSION,
        }
    }
}

impl ProviderConfig {
    pub const MODE_ENV: &'static str = "CODEQA_EMBEDDING_MODE";
    pub const DIM_ENV: &'static str = "CODEQA_EMBEDDING_DIM";

    /// Apply `CODEQA_EMBEDDING_MODE` / `CODEQA_EMBEDDING_DIM` values
    pub fn apply_overrides(&mut self, mode: Option<String>, dim: Option<String>) -> Result<()> {
        if let Some(mode) = mode {
            self.embedding_mode = mode.parse()?;
        }
        if let Some(dim) = dim {
            self.embedding_dim = dim.trim().parse().map_err(|_| {
                ProviderError::InvalidConfig(format!("{} must be a positive integer", Self::DIM_ENV))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_mode == EmbeddingMode::Stub && self.embedding_dim == 0 {
            return Err(ProviderError::InvalidConfig(
                "provider.embedding_dim must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenUsage;

    struct SlowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        fn name(&self) -> &str {
            "slow"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![1.0])
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl GenerationProvider for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            messages: &[Message],
            _options: &GenerateOptions,
        ) -> Result<Generation> {
            Ok(Generation {
                text: messages.last().map(|m| m.content.clone()).unwrap_or_default(),
                usage: TokenUsage::new(3, 1),
            })
        }
    }

    #[tokio::test]
    async fn missing_capabilities_are_reported() {
        let caps = Capabilities::new();
        assert!(matches!(
            caps.require_embedder(),
            Err(ProviderError::NotConfigured("embedding"))
        ));
        let err = caps
            .generate(&[Message::user("hi")], &GenerateOptions::default(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured("generation"));
    }

    #[tokio::test]
    async fn embed_respects_timeout() {
        let caps = Capabilities::new().with_embedder(Arc::new(SlowEmbedder));
        let err = caps
            .embed("text", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { operation: "embedding", after_ms: 20 }));
    }

    #[tokio::test]
    async fn generate_passes_through() {
        let caps = Capabilities::new().with_generator(Arc::new(EchoGenerator));
        let out = caps
            .generate(&[Message::user("ping")], &GenerateOptions::default(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(out.text, "ping");
        assert_eq!(out.usage.total(), 4);
    }

    #[test]
    fn config_builds_stub_embedder() {
        let caps = Capabilities::from_config(&ProviderConfig::default()).unwrap();
        let embedder = caps.embedder().unwrap();
        assert_eq!(embedder.name(), "stub");
        assert_eq!(embedder.dimension(), Some(DEFAULT_STUB_DIMENSION));

        let none = ProviderConfig {
            embedding_mode: EmbeddingMode::None,
            ..ProviderConfig::default()
        };
        assert!(Capabilities::from_config(&none).unwrap().embedder().is_none());
    }

    #[test]
    fn overrides_parse_and_validate() {
        let mut config = ProviderConfig::default();
        config
            .apply_overrides(Some("NONE".into()), Some("32".into()))
            .unwrap();
        assert_eq!(config.embedding_mode, EmbeddingMode::None);
        assert_eq!(config.embedding_dim, 32);

        assert!(config.apply_overrides(Some("fast".into()), None).is_err());
        assert!(config.apply_overrides(None, Some("wide".into())).is_err());

        let zero = ProviderConfig {
            embedding_dim: 0,
            ..ProviderConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn config_reads_from_toml() {
        let config: ProviderConfig =
            toml::from_str("embedding_mode = \"none\"\nembedding_dim = 8\n").unwrap();
        assert_eq!(config.embedding_mode, EmbeddingMode::None);
        assert_eq!(config.embedding_dim, 8);
    }
}
