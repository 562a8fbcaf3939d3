//! BERT sentence embedder on candle.

use std::path::Path;

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::config::Pooling;
use super::device::select_device;
use super::error::EmbeddingError;
use super::utils::load_batch_tokenizer;

/// Sentence embedder over a BERT-family encoder (`config.json`,
/// `model.safetensors`, `tokenizer.json` in one directory).
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    pooling: Pooling,
    hidden_size: usize,
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("device", &format!("{:?}", self.device))
            .field("pooling", &self.pooling)
            .field("hidden_size", &self.hidden_size)
            .finish()
    }
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, pooling: Pooling, max_seq_len: usize) -> Result<Self, EmbeddingError> {
        if !model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: model_dir.to_path_buf(),
            });
        }

        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");
        for required in [&config_path, &weights_path] {
            if !required.exists() {
                return Err(EmbeddingError::ModelNotFound {
                    path: required.clone(),
                });
            }
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for BERT embedder");

        let config_content = std::fs::read_to_string(&config_path)?;
        let config: Config =
            serde_json::from_str(&config_content).map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("Failed to parse config.json: {}", e),
            })?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to map weights: {}", e),
        })?;

        let prefixed = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            Some("bert")
        } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
            Some("roberta")
        } else {
            None
        };
        let model = match prefixed {
            Some(prefix) => BertModel::load(vb.pp(prefix), &config),
            None => BertModel::load(vb, &config),
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to load BERT weights: {}", e),
        })?;

        let tokenizer = load_batch_tokenizer(model_dir, max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(
            model_dir = %model_dir.display(),
            hidden_size = config.hidden_size,
            num_layers = config.num_hidden_layers,
            ?pooling,
            "BERT embedder loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            pooling,
            hidden_size: config.hidden_size,
        })
    }

    pub fn dimension(&self) -> usize {
        self.hidden_size
    }

    /// Encodes a batch; one (unnormalized) vector per input.
    pub fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        debug!(
            batch = texts.len(),
            seq_len = input_ids.dim(1)?,
            "Running BERT forward pass"
        );

        // [batch, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = match self.pooling {
            Pooling::Cls => hidden.i((.., 0, ..))?,
            Pooling::Mean => {
                let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
                let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
                let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
                summed.broadcast_div(&counts)?
            }
        };

        Ok(pooled.to_vec2::<f32>()?)
    }
}
