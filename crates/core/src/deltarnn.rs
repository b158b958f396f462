//! Delta-RNN cell.
//!
//! ```text
//! d1 = β1 ⊙ (W · x) + β2 ⊙ (W_rec · yPrev)
//! d2 = α ⊙ (W · x) ⊙ (W_rec · yPrev)
//! c  = tanh(d1 + d2 + b)
//! p  = σ(W · x + b_part)
//! y  = tanh(p ⊙ c + (1 − p) ⊙ yPrev)
//! ```
//!
//! The first step has no `yPrev`: `d1 = β1 ⊙ (W · x)`, there is no `d2`, and
//! `y = tanh(p ⊙ c)`. This is the exact first-step rule, not a zero-padded
//! approximation of the general one.

use candle_core::{Result, Tensor};
use candle_nn::{ops::sigmoid, VarBuilder};

use crate::cell::{mat_vec, BIAS_INIT, WEIGHT_INIT};

/// Trainable Delta-RNN parameters.
#[derive(Debug, Clone)]
pub struct DeltaRnnParams {
    w: Tensor,
    w_rec: Tensor,
    b: Tensor,
    b_part: Tensor,
    alpha: Tensor,
    beta1: Tensor,
    beta2: Tensor,
}

/// Everything computed at one Delta-RNN step.
#[derive(Debug, Clone)]
pub struct DeltaRnnState {
    pub d1: Tensor,
    /// Cross term; `None` on the first step.
    pub d2: Option<Tensor>,
    pub c: Tensor,
    /// Partition gate.
    pub p: Tensor,
    pub y: Tensor,
}

impl DeltaRnnParams {
    pub fn new(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            w: vb.get_with_hints((out_dim, in_dim), "w", WEIGHT_INIT)?,
            w_rec: vb.get_with_hints((out_dim, out_dim), "w_rec", WEIGHT_INIT)?,
            b: vb.get_with_hints(out_dim, "b", BIAS_INIT)?,
            b_part: vb.get_with_hints(out_dim, "b_part", BIAS_INIT)?,
            alpha: vb.get_with_hints(out_dim, "alpha", BIAS_INIT)?,
            beta1: vb.get_with_hints(out_dim, "beta1", BIAS_INIT)?,
            beta2: vb.get_with_hints(out_dim, "beta2", BIAS_INIT)?,
        })
    }

    pub fn input_size(&self) -> usize {
        self.w.dims()[1]
    }

    pub fn output_size(&self) -> usize {
        self.w.dims()[0]
    }

    /// One recurrence step. `prev` is `None` on the first step.
    pub fn step(&self, x: &Tensor, prev: Option<&DeltaRnnState>) -> Result<DeltaRnnState> {
        let wx = mat_vec(&self.w, x)?;
        let p = sigmoid(&(&wx + &self.b_part)?)?;
        match prev {
            None => {
                let d1 = (&self.beta1 * &wx)?;
                let c = (&d1 + &self.b)?.tanh()?;
                let y = (&p * &c)?.tanh()?;
                Ok(DeltaRnnState {
                    d1,
                    d2: None,
                    c,
                    p,
                    y,
                })
            }
            Some(prev) => {
                let wy_rec = mat_vec(&self.w_rec, &prev.y)?;
                let d1 = ((&self.beta1 * &wx)? + (&self.beta2 * &wy_rec)?)?;
                let d2 = ((&self.alpha * &wx)? * &wy_rec)?;
                let c = ((&d1 + &d2)? + &self.b)?.tanh()?;
                let keep = (p.affine(-1.0, 1.0)? * &prev.y)?;
                let y = ((&p * &c)? + keep)?.tanh()?;
                Ok(DeltaRnnState {
                    d1,
                    d2: Some(d2),
                    c,
                    p,
                    y,
                })
            }
        }
    }
}
