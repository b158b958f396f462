//! Synthetic attention (Tay et al., 2020, "Synthesizer").
//!
//! Attention scores are not dot products between tokens: each position `j`
//! owns a learned row `W[j]`, and the score of `j` for output `i` is
//! `W[j] · relu(FFN(x_i))`. Only the first `len` rows of `W` are used, so
//! sequences are capped at `max_length`.
//!
//! ```text
//! values  = V(x)                        (len, value_size)
//! scores  = W[..len] · relu(FFN(x))ᵀ    (len, len)
//! prob_i  = softmax(scores[:, i])
//! ctx_i   = prob_iᵀ · values
//! ```

use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

use seqlab_common::SyntheticAttentionConfig;

use crate::cell::WEIGHT_INIT;

/// Context vectors plus the attention distribution behind each of them.
#[derive(Debug, Clone)]
pub struct Attended {
    /// One context vector per input position.
    pub context: Vec<Tensor>,
    /// `probs[i][j]`: weight of position `j` in `context[i]`.
    pub probs: Vec<Tensor>,
}

pub struct SyntheticAttention {
    ffn: Linear,
    value: Linear,
    w: Tensor,
    max_length: usize,
}

impl SyntheticAttention {
    pub fn new(
        input_size: usize,
        config: &SyntheticAttentionConfig,
        vb: VarBuilder,
    ) -> Result<Self> {
        let ffn = candle_nn::linear(input_size, config.hidden_size, vb.pp("ffn"))?;
        let value = candle_nn::linear(input_size, config.value_size, vb.pp("value"))?;
        let w = vb.get_with_hints((config.max_length, config.hidden_size), "w", WEIGHT_INIT)?;
        Ok(Self {
            ffn,
            value,
            w,
            max_length: config.max_length,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn forward(&self, xs: &[Tensor]) -> Result<Attended> {
        let len = xs.len();
        if len == 0 {
            return Ok(Attended {
                context: Vec::new(),
                probs: Vec::new(),
            });
        }
        if len > self.max_length {
            candle_core::bail!(
                "sequence length {len} exceeds synthetic attention max_length {}",
                self.max_length
            );
        }
        let x = Tensor::stack(xs, 0)?;
        let values = self.value.forward(&x)?;
        let rectified = self.ffn.forward(&x)?.relu()?;
        let weights = self.w.narrow(0, 0, len)?;
        let scores = weights.matmul(&rectified.t()?)?;
        // column i holds the scores for output i
        let probs = candle_nn::ops::softmax(&scores, 0)?.t()?.contiguous()?;
        let context = probs.matmul(&values)?;
        Ok(Attended {
            context: (0..len).map(|i| context.get(i)).collect::<Result<_>>()?,
            probs: (0..len).map(|i| probs.get(i)).collect::<Result<_>>()?,
        })
    }
}
