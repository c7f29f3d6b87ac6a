//! Local XLM-RoBERTa family embedder (BGE-M3 and friends) on candle.
//!
//! Expects a model directory with `tokenizer.json`, `config.json` and
//! `pytorch_model.bin`.

mod device;
mod pool;
mod tokenize;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use newsroom_core::config::{expand_path, EmbeddingSettings};
use newsroom_core::traits::EmbeddingProvider;
use newsroom_core::{EmbeddingVector, ProviderError, ProviderErrorCode};

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

const MAX_LEN: usize = 256;

pub struct LocalModelEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    id: String,
}

impl LocalModelEmbedder {
    pub fn load(model_dir: &Path) -> Result<Self, ProviderError> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading local embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| config_err(format!("failed to load tokenizer from {}: {}", tokenizer_path.display(), e)))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| config_err(format!("failed to read {}: {}", config_path.display(), e)))?;
        let config: XLMRobertaConfig =
            serde_json::from_str(&raw).map_err(|e| config_err(format!("invalid model config: {}", e)))?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)
            .map_err(|e| config_err(format!("failed to read weights {}: {}", weights_path.display(), e)))?
            .into_iter()
            .collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb).map_err(|e| config_err(format!("failed to build model: {}", e)))?;

        let dim = config.hidden_size;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "model".to_string());
        info!(dim, "local embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, id: format!("local:{}:d{}", name, dim) })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, ProviderError> {
        Self::load(&resolve_model_dir(settings.model_dir.as_deref())?)
    }

    fn forward(&self, text: &str) -> candle_core::Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize_on_device(&self.tokenizer, text, MAX_LEN, &self.device).map_err(candle_core::Error::wrap)?;
        let token_type_ids = Tensor::zeros((1, MAX_LEN), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()
    }
}

impl EmbeddingProvider for LocalModelEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let v = self
            .forward(text)
            .map_err(|e| ProviderError::new(ProviderErrorCode::Server, format!("local inference failed: {}", e)))?;
        debug!(chars = text.len(), "embedded text locally");
        Ok(v)
    }
}

fn config_err(message: String) -> ProviderError {
    ProviderError::new(ProviderErrorCode::Config, message)
}

/// Configured directory first, then `APP_MODEL_DIR`, then `models/bge-m3`.
fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf, ProviderError> {
    let candidates = configured
        .map(expand_path)
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok().map(expand_path))
        .chain(std::iter::once(PathBuf::from("models/bge-m3")));
    for p in candidates {
        if p.exists() {
            return Ok(p);
        }
    }
    Err(config_err("could not locate a local embedding model directory".to_string()))
}
