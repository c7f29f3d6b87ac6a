#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Embedding providers.
//!
//! - [`HashingEmbedder`]: offline and deterministic
//! - [`OpenAiEmbedder`]: OpenAI-compatible HTTP endpoint
//! - `LocalModelEmbedder`: candle model on local disk (feature `local-model`)

mod hashing;
pub mod http;
#[cfg(feature = "local-model")]
pub mod local;
mod openai;

pub use hashing::HashingEmbedder;
#[cfg(feature = "local-model")]
pub use local::LocalModelEmbedder;
pub use openai::OpenAiEmbedder;

use newsroom_core::config::{EmbeddingBackend, EmbeddingSettings};
use newsroom_core::traits::EmbeddingProvider;
use newsroom_core::ProviderError;
use tracing::info;

/// Builds the configured provider. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hashing backend regardless of configuration.
pub fn from_settings(settings: &EmbeddingSettings) -> Result<Box<dyn EmbeddingProvider>, ProviderError> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let backend = if use_fake { EmbeddingBackend::Hashing } else { settings.backend };

    let provider: Box<dyn EmbeddingProvider> = match backend {
        EmbeddingBackend::Hashing => Box::new(HashingEmbedder::new(settings.hashing_dim)),
        EmbeddingBackend::OpenAi => Box::new(OpenAiEmbedder::from_settings(settings)?),
        EmbeddingBackend::Local => local_backend(settings)?,
    };
    info!(provider = provider.id(), dim = provider.dim(), "embedding provider ready");
    Ok(provider)
}

#[cfg(feature = "local-model")]
fn local_backend(settings: &EmbeddingSettings) -> Result<Box<dyn EmbeddingProvider>, ProviderError> {
    Ok(Box::new(LocalModelEmbedder::from_settings(settings)?))
}

#[cfg(not(feature = "local-model"))]
fn local_backend(_settings: &EmbeddingSettings) -> Result<Box<dyn EmbeddingProvider>, ProviderError> {
    Err(ProviderError::new(
        newsroom_core::ProviderErrorCode::Config,
        "the local embedding backend needs the `local-model` feature",
    ))
}
