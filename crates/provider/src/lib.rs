//! External capabilities consumed by the retrieval engine.
//!
//! Concrete model backends live outside this workspace; the engine only sees the
//! [`EmbeddingProvider`] and [`GenerationProvider`] contracts, bundled in an explicit
//! [`Capabilities`] object. [`StubEmbedder`] is a deterministic offline embedder.

mod capability;
mod error;
mod stub;
mod types;

pub use capability::{
    Capabilities, EmbeddingMode, EmbeddingProvider, GenerationProvider, ProviderConfig,
};
pub use error::{ProviderError, Result};
pub use stub::{StubEmbedder, DEFAULT_STUB_DIMENSION};
pub use types::{GenerateOptions, Generation, Message, Role, TokenUsage};
