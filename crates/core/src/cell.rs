//! Closed set of recurrent cell variants behind one step contract.
//!
//! Both variants map `(params, x_t, prev_state) → new_state`; [`CellParams`]
//! and [`StepState`] dispatch between them the same way the rest of the
//! workspace dispatches over fixed layer choices.

use candle_core::{Result, Tensor};
use candle_nn::{Init, VarBuilder};

use seqlab_common::{CellKind, LabelerConfig};

use crate::deltarnn::{DeltaRnnParams, DeltaRnnState};
use crate::error::EncoderError;
use crate::ran::{RanParams, RanState};

/// Initial distribution for weight matrices when no checkpoint is loaded.
pub(crate) const WEIGHT_INIT: Init = Init::Randn {
    mean: 0.,
    stdev: 0.1,
};

/// Biases and per-unit mixing vectors start at zero.
pub(crate) const BIAS_INIT: Init = Init::Const(0.);

/// Matrix-vector product: `(out, in) · (in,) → (out,)`.
pub(crate) fn mat_vec(w: &Tensor, x: &Tensor) -> Result<Tensor> {
    w.matmul(&x.unsqueeze(1)?)?.squeeze(1)
}

/// Parameters of one recurrent cell instance.
#[derive(Debug, Clone)]
pub enum CellParams {
    Ran(RanParams),
    DeltaRnn(DeltaRnnParams),
}

/// State recorded for one processed time step.
#[derive(Debug, Clone)]
pub enum StepState {
    Ran(RanState),
    DeltaRnn(DeltaRnnState),
}

impl StepState {
    /// Output vector `y` of this step.
    pub fn output(&self) -> &Tensor {
        match self {
            Self::Ran(s) => &s.y,
            Self::DeltaRnn(s) => &s.y,
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            Self::Ran(_) => CellKind::Ran,
            Self::DeltaRnn(_) => CellKind::DeltaRnn,
        }
    }

    pub fn as_ran(&self) -> Option<&RanState> {
        match self {
            Self::Ran(s) => Some(s),
            Self::DeltaRnn(_) => None,
        }
    }

    pub fn as_delta_rnn(&self) -> Option<&DeltaRnnState> {
        match self {
            Self::DeltaRnn(s) => Some(s),
            Self::Ran(_) => None,
        }
    }
}

impl From<RanState> for StepState {
    fn from(s: RanState) -> Self {
        Self::Ran(s)
    }
}

impl From<DeltaRnnState> for StepState {
    fn from(s: DeltaRnnState) -> Self {
        Self::DeltaRnn(s)
    }
}

impl CellParams {
    /// Construct the variant selected by `config.cell`. `vb` should be scoped
    /// to the cell prefix (e.g. `vb.pp("cell")`).
    pub fn new(config: &LabelerConfig, vb: VarBuilder) -> Result<Self> {
        match config.cell {
            CellKind::Ran => Self::ran(config.input_size, config.hidden_size, vb),
            CellKind::DeltaRnn => Self::delta_rnn(config.input_size, config.hidden_size, vb),
        }
    }

    pub fn ran(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self::Ran(RanParams::new(in_dim, out_dim, vb)?))
    }

    pub fn delta_rnn(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self::DeltaRnn(DeltaRnnParams::new(in_dim, out_dim, vb)?))
    }

    pub fn kind(&self) -> CellKind {
        match self {
            Self::Ran(_) => CellKind::Ran,
            Self::DeltaRnn(_) => CellKind::DeltaRnn,
        }
    }

    pub fn input_size(&self) -> usize {
        match self {
            Self::Ran(p) => p.input_size(),
            Self::DeltaRnn(p) => p.input_size(),
        }
    }

    pub fn output_size(&self) -> usize {
        match self {
            Self::Ran(p) => p.output_size(),
            Self::DeltaRnn(p) => p.output_size(),
        }
    }

    /// Check that `state` was produced by this variant.
    pub fn check_state(&self, state: &StepState) -> std::result::Result<(), EncoderError> {
        if state.kind() != self.kind() {
            return Err(EncoderError::VariantMismatch {
                expected: self.kind(),
                found: state.kind(),
            });
        }
        Ok(())
    }

    /// Advance the recurrence by one input vector.
    pub fn step(
        &self,
        x: &Tensor,
        prev: Option<&StepState>,
    ) -> std::result::Result<StepState, EncoderError> {
        let found = x.dims1()?;
        if found != self.input_size() {
            return Err(EncoderError::InputSize {
                expected: self.input_size(),
                found,
            });
        }
        match (self, prev) {
            (Self::Ran(p), None) => Ok(p.step(x, None)?.into()),
            (Self::Ran(p), Some(StepState::Ran(s))) => Ok(p.step(x, Some(s))?.into()),
            (Self::DeltaRnn(p), None) => Ok(p.step(x, None)?.into()),
            (Self::DeltaRnn(p), Some(StepState::DeltaRnn(s))) => Ok(p.step(x, Some(s))?.into()),
            (_, Some(state)) => Err(EncoderError::VariantMismatch {
                expected: self.kind(),
                found: state.kind(),
            }),
        }
    }
}
