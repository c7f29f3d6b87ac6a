//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__TOP_K=6`). Paths in settings may use `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`Config::load`] but reads the TOML files from `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Extracts and validates the full typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub writer: WriterSettings,
    pub sources: SourceSettings,
    pub snapshots: SnapshotSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate().map_err(|e| Error::InvalidConfig(format!("chunking: {}", e)))?;
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be greater than 0".to_string()));
        }
        if self.retrieval.embed_workers == 0 {
            return Err(Error::InvalidConfig("retrieval.embed_workers must be greater than 0".to_string()));
        }
        if self.writer.paragraphs == 0 {
            return Err(Error::InvalidConfig("writer.paragraphs must be greater than 0".to_string()));
        }
        if self.writer.repair_attempts > MAX_REPAIR_ATTEMPTS {
            return Err(Error::InvalidConfig(format!(
                "writer.repair_attempts must be at most {}, got {}",
                MAX_REPAIR_ATTEMPTS, self.writer.repair_attempts
            )));
        }
        if !(0.0..=2.0).contains(&self.writer.temperature) {
            return Err(Error::InvalidConfig(format!("writer.temperature {} is outside 0.0..=2.0", self.writer.temperature)));
        }
        if self.embedding.backend == EmbeddingBackend::Hashing && self.embedding.hashing_dim == 0 {
            return Err(Error::InvalidConfig("embedding.hashing_dim must be greater than 0".to_string()));
        }
        if self.sources.max_pages == 0 {
            return Err(Error::InvalidConfig("sources.max_pages must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Worker threads used for embedding during index builds; 1 embeds sequentially.
    pub embed_workers: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 4, embed_workers: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingBackend {
    #[serde(rename = "hashing")]
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "local")]
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub dimensions: Option<usize>,
    pub hashing_dim: usize,
    pub model_dir: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::OpenAi,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            dimensions: None,
            hashing_dim: 384,
            model_dir: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// The writer re-prompts at most once after a structurally invalid response.
pub const MAX_REPAIR_ATTEMPTS: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    pub paragraphs: usize,
    /// 0 or 1.
    pub repair_attempts: usize,
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            paragraphs: 3,
            repair_attempts: 1,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.4,
            max_tokens: 900,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub wikipedia_api: String,
    pub max_pages: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            wikipedia_api: "https://en.wikipedia.org/w/api.php".to_string(),
            max_pages: 3,
            user_agent: "newsroom/0.1 (article generator)".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub dir: String,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self { dir: "~/.cache/newsroom/snapshots".to_string() }
    }
}

impl SnapshotSettings {
    pub fn dir_path(&self) -> PathBuf { expand_path(&self.dir) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

