use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use newsroom_core::{ProviderError, ProviderErrorCode};

/// XLM-R padding token id.
const PAD_ID: u32 = 1;

/// Encodes `text` into `[1, max_len]` id and mask tensors, truncating or padding.
pub fn tokenize_on_device(
    tokenizer: &Tokenizer,
    text: &str,
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor), ProviderError> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| ProviderError::new(ProviderErrorCode::InvalidResponse, format!("tokenization failed: {}", e)))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    ids.resize(max_len, PAD_ID);
    mask.resize(max_len, 0);
    let to_tensor = |v: Vec<u32>| {
        Tensor::from_vec(v, (1, max_len), device)
            .map_err(|e| ProviderError::new(ProviderErrorCode::Server, format!("tensor construction failed: {}", e)))
    };
    Ok((to_tensor(ids)?, to_tensor(mask)?))
}
