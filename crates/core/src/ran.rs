//! Recurrent Additive Network (RAN) cell.
//!
//! ```text
//! inG  = σ(W_in · x + W_in_rec · yPrev + b_in)
//! forG = σ(W_for · x + W_for_rec · yPrev + b_for)
//! cand = W_cand · x + b_cand
//! c    = inG ⊙ cand + forG ⊙ cPrev
//! y    = tanh(c)
//! ```
//!
//! On the first step there is no `yPrev`, so the recurrent terms vanish, and
//! no `cPrev`, so the forget contribution is omitted entirely.

use candle_core::{Result, Tensor};
use candle_nn::{ops::sigmoid, VarBuilder};

use crate::cell::{mat_vec, BIAS_INIT, WEIGHT_INIT};

/// Trainable RAN parameters. Matrices are `(out, in)` / `(out, out)`.
#[derive(Debug, Clone)]
pub struct RanParams {
    w_in: Tensor,
    w_in_rec: Tensor,
    b_in: Tensor,
    w_for: Tensor,
    w_for_rec: Tensor,
    b_for: Tensor,
    w_cand: Tensor,
    b_cand: Tensor,
}

/// Everything computed at one RAN step, kept for attribution.
#[derive(Debug, Clone)]
pub struct RanState {
    pub in_g: Tensor,
    pub for_g: Tensor,
    pub cand: Tensor,
    pub c: Tensor,
    pub y: Tensor,
}

fn gate_params(
    in_dim: usize,
    out_dim: usize,
    vb: &VarBuilder,
    name: &str,
) -> Result<(Tensor, Tensor, Tensor)> {
    let w = vb.get_with_hints((out_dim, in_dim), &format!("w_{name}"), WEIGHT_INIT)?;
    let w_rec = vb.get_with_hints((out_dim, out_dim), &format!("w_{name}_rec"), WEIGHT_INIT)?;
    let b = vb.get_with_hints(out_dim, &format!("b_{name}"), BIAS_INIT)?;
    Ok((w, w_rec, b))
}

/// `W · x + b`, plus `W_rec · yPrev` once a previous output exists.
fn gate_affine(
    w: &Tensor,
    w_rec: &Tensor,
    b: &Tensor,
    x: &Tensor,
    y_prev: Option<&Tensor>,
) -> Result<Tensor> {
    let mut a = (mat_vec(w, x)? + b)?;
    if let Some(y) = y_prev {
        a = (a + mat_vec(w_rec, y)?)?;
    }
    Ok(a)
}

impl RanParams {
    pub fn new(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Self> {
        let (w_in, w_in_rec, b_in) = gate_params(in_dim, out_dim, &vb, "in")?;
        let (w_for, w_for_rec, b_for) = gate_params(in_dim, out_dim, &vb, "for")?;
        let w_cand = vb.get_with_hints((out_dim, in_dim), "w_cand", WEIGHT_INIT)?;
        let b_cand = vb.get_with_hints(out_dim, "b_cand", BIAS_INIT)?;
        Ok(Self {
            w_in,
            w_in_rec,
            b_in,
            w_for,
            w_for_rec,
            b_for,
            w_cand,
            b_cand,
        })
    }

    pub fn input_size(&self) -> usize {
        self.w_in.dims()[1]
    }

    pub fn output_size(&self) -> usize {
        self.w_in.dims()[0]
    }

    /// One recurrence step. `prev` is `None` on the first step.
    pub fn step(&self, x: &Tensor, prev: Option<&RanState>) -> Result<RanState> {
        let y_prev = prev.map(|s| &s.y);
        let in_g = sigmoid(&gate_affine(&self.w_in, &self.w_in_rec, &self.b_in, x, y_prev)?)?;
        let for_g = sigmoid(&gate_affine(
            &self.w_for,
            &self.w_for_rec,
            &self.b_for,
            x,
            y_prev,
        )?)?;
        let cand = (mat_vec(&self.w_cand, x)? + &self.b_cand)?;
        let mut c = (&in_g * &cand)?;
        if let Some(prev) = prev {
            c = (c + (&for_g * &prev.c)?)?;
        }
        let y = c.tanh()?;
        Ok(RanState {
            in_g,
            for_g,
            cand,
            c,
            y,
        })
    }
}
