use std::fmt;

use thiserror::Error;

/// Failure category reported by an external embedding or generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    Transport,
    Timeout,
    Auth,
    RateLimited,
    Server,
    InvalidResponse,
    Config,
}

impl ProviderErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::InvalidResponse => "invalid_response",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by provider implementations (`EmbeddingProvider`, `GenerativeProvider`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Transport, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index is empty")]
    EmptyIndex,

    #[error("No relevant context found for topic '{0}'")]
    NoRelevantContext(String),

    #[error("Embedding failed for {target}: {source}")]
    EmbeddingFailure {
        target: String,
        #[source]
        source: ProviderError,
    },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed generation: {0}")]
    MalformedGeneration(String),

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
