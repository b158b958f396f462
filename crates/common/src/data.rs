//! Input records for the labeler and conversion to Candle tensors.
//!
//! The upstream embedding stage hands over one fixed-size vector per token;
//! on disk that is a JSON array of [`SequenceInput`] records.

use std::path::Path;

use anyhow::{Context, Result as AnyhowResult};
use candle_core::{Device, Result, Tensor};
use serde::{Deserialize, Serialize};

use crate::labels::{TokenLabel, TokenSpan};

/// One sequence to label: tokenizer spans and their aligned vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceInput {
    pub tokens: Vec<TokenSpan>,
    pub vectors: Vec<Vec<f32>>,
}

impl SequenceInput {
    /// Check that tokens and vectors line up and all vectors have `input_size` entries.
    pub fn validate(&self, input_size: usize) -> AnyhowResult<()> {
        if self.tokens.len() != self.vectors.len() {
            anyhow::bail!(
                "{} tokens but {} vectors",
                self.tokens.len(),
                self.vectors.len()
            );
        }
        if let Some((i, v)) = self
            .vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != input_size)
        {
            anyhow::bail!(
                "vector {i} has {} entries, expected {input_size}",
                v.len()
            );
        }
        Ok(())
    }
}

/// Turn raw vectors into rank-1 `f32` tensors, one per token.
pub fn vectors_to_tensors(vectors: &[Vec<f32>], device: &Device) -> Result<Vec<Tensor>> {
    vectors
        .iter()
        .map(|v| Tensor::from_slice(v, v.len(), device))
        .collect()
}

/// Load a JSON array of [`SequenceInput`] records.
pub fn load_sequences(path: &Path) -> AnyhowResult<Vec<SequenceInput>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let sequences = serde_json::from_str(&json)
        .with_context(|| format!("parse sequences from {}", path.display()))?;
    Ok(sequences)
}

/// Load a JSON array of already-tagged tokens.
pub fn load_token_labels(path: &Path) -> AnyhowResult<Vec<TokenLabel>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let tokens = serde_json::from_str(&json)
        .with_context(|| format!("parse tagged tokens from {}", path.display()))?;
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SequenceInput {
        SequenceInput {
            tokens: vec![TokenSpan::new("New", 0, 3), TokenSpan::new("York", 4, 8)],
            vectors: vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]],
        }
    }

    #[test]
    fn validate_checks_alignment() {
        let mut input = sample();
        assert!(input.validate(3).is_ok());
        assert!(input.validate(4).is_err());
        input.vectors.pop();
        assert!(input.validate(3).is_err());
    }

    #[test]
    fn vectors_become_rank1_tensors() {
        let input = sample();
        let ts = vectors_to_tensors(&input.vectors, &Device::Cpu).unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts[1].dims(), &[3]);
        assert_eq!(ts[1].to_vec1::<f32>().unwrap(), vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn sequence_json_shape() {
        let json = r#"[{"tokens":[{"text":"Bob","start":0,"end":3}],"vectors":[[1.0,2.0]]}]"#;
        let seqs: Vec<SequenceInput> = serde_json::from_str(json).unwrap();
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].tokens[0].offsets.end, 3);
        assert!(seqs[0].validate(2).is_ok());
    }
}
