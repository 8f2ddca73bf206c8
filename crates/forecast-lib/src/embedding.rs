//! Sentence embeddings from an exported transformer encoder
//!
//! The encoder is an ONNX export of a sentence-transformers model such as
//! all-MiniLM-L6-v2, run through tract and paired with its HuggingFace
//! `tokenizer.json`. Token states are mean-pooled over the attention mask and
//! L2-normalised. Exports that already pool (`[1, hidden]` output) are only
//! normalised.

use crate::error::EmbeddingError;
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tract_onnx::prelude::*;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Encoder inputs recognised by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderInput {
    InputIds,
    AttentionMask,
    TokenTypeIds,
}

impl EncoderInput {
    fn from_name(name: &str) -> Result<Self, EmbeddingError> {
        match name {
            "input_ids" => Ok(Self::InputIds),
            "attention_mask" => Ok(Self::AttentionMask),
            "token_type_ids" => Ok(Self::TokenTypeIds),
            other => Err(EmbeddingError::UnsupportedInput(other.to_string())),
        }
    }
}

/// Tokenizer plus ONNX encoder producing one vector per text
pub struct SentenceEmbedder {
    model: InferenceModel,
    inputs: Vec<EncoderInput>,
    tokenizer: Tokenizer,
}

impl SentenceEmbedder {
    /// Load an ONNX encoder and its `tokenizer.json`
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self, EmbeddingError> {
        let model_bytes = std::fs::read(model_path)?;
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        Self::new(&model_bytes, tokenizer)
    }

    /// Create an embedder from model bytes
    pub fn new(model_bytes: &[u8], tokenizer: Tokenizer) -> Result<Self, EmbeddingError> {
        let model = tract_onnx::onnx().model_for_read(&mut std::io::Cursor::new(model_bytes))?;
        let inputs = model
            .input_outlets()?
            .iter()
            .map(|outlet| EncoderInput::from_name(&model.node(outlet.node).name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            model,
            inputs,
            tokenizer,
        })
    }

    /// Embed one text
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let start = Instant::now();

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        let seq_len = encoding.get_ids().len();
        if seq_len == 0 {
            return Err(EmbeddingError::EmptyInput);
        }

        let plan = self.plan_for(seq_len)?;
        let mut tensors: TVec<TValue> = tvec!();
        for input in &self.inputs {
            let tokens = match input {
                EncoderInput::InputIds => encoding.get_ids(),
                EncoderInput::AttentionMask => encoding.get_attention_mask(),
                EncoderInput::TokenTypeIds => encoding.get_type_ids(),
            };
            tensors.push(token_tensor(tokens)?.into());
        }

        let outputs = plan.run(tensors)?;
        let output = outputs
            .first()
            .ok_or_else(|| EmbeddingError::OutputShape(Vec::new()))?;
        let view = output.to_array_view::<f32>()?;
        let shape = view.shape().to_vec();
        let values: Vec<f32> = view.iter().copied().collect();

        let pooled = match shape.as_slice() {
            [1, len, dim] if *len == seq_len => {
                mean_pool(&values, *dim, encoding.get_attention_mask())
            }
            [1, _] => values,
            _ => return Err(EmbeddingError::OutputShape(shape)),
        };

        debug!(
            tokens = seq_len,
            dimensions = pooled.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Embedding computed"
        );
        Ok(normalize(pooled))
    }

    /// Fix the sequence length and optimize for it
    fn plan_for(&self, seq_len: usize) -> Result<TractModel, EmbeddingError> {
        let mut model = self.model.clone();
        for index in 0..self.inputs.len() {
            model = model.with_input_fact(index, i64::fact([1, seq_len]).into())?;
        }
        Ok(model.into_optimized()?.into_runnable()?)
    }
}

fn token_tensor(tokens: &[u32]) -> Result<Tensor, EmbeddingError> {
    let data: Vec<i64> = tokens.iter().map(|&t| i64::from(t)).collect();
    let array = tract_ndarray::Array2::from_shape_vec((1, data.len()), data)
        .map_err(|e| EmbeddingError::Model(e.into()))?;
    Ok(array.into())
}

/// Average the token vectors whose mask entry is set.
///
/// `hidden` is row-major `[tokens, dim]`. A mask with no set entries pools to zeros.
pub fn mean_pool(hidden: &[f32], dim: usize, mask: &[u32]) -> Vec<f32> {
    if dim == 0 {
        return Vec::new();
    }

    let mut sum = vec![0.0f32; dim];
    let mut count = 0u32;
    for (token, _) in hidden.chunks_exact(dim).zip(mask).filter(|(_, m)| **m != 0) {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
        count += 1;
    }

    if count > 0 {
        let count = count as f32;
        sum.iter_mut().for_each(|v| *v /= count);
    }
    sum
}

/// Scale to unit L2 norm; the zero vector is returned unchanged
pub fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}
