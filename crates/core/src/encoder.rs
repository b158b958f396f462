//! Per-sequence encoder context.
//!
//! A [`SequenceEncoder`] owns the state history of exactly one sequence.
//! Steps run strictly in order because each one reads the previous state;
//! independent sequences get independent encoders and can run in parallel
//! ([`encode_batch`]).

use candle_core::Tensor;
use rayon::prelude::*;

use crate::cell::{CellParams, StepState};
use crate::error::EncoderError;
use crate::importance::{attribute, ImportanceTable};

/// Drives a cell across one sequence, recording every step.
///
/// Create one per sequence and drop it afterwards; reusing an encoder for a
/// second sequence would chain the recurrence across the two.
pub struct SequenceEncoder<'a> {
    params: &'a CellParams,
    states: Vec<StepState>,
}

/// Result of encoding one sequence.
#[derive(Debug, Clone)]
pub struct Encoded {
    /// One output vector per input, index-aligned.
    pub outputs: Vec<Tensor>,
    /// Full state history (a seeded initial state, if any, comes first).
    pub states: Vec<StepState>,
}

impl<'a> SequenceEncoder<'a> {
    pub fn new(params: &'a CellParams) -> Self {
        Self {
            params,
            states: Vec::new(),
        }
    }

    /// Seed the recurrence with an externally supplied state.
    ///
    /// Must be called before any input is processed.
    pub fn set_initial_state(&mut self, state: StepState) -> Result<(), EncoderError> {
        if !self.states.is_empty() {
            return Err(EncoderError::InitialStateAfterInput {
                processed: self.states.len(),
            });
        }
        self.params.check_state(&state)?;
        self.states.push(state);
        Ok(())
    }

    /// Process `xs` in order and return their output vectors.
    ///
    /// May be called again to continue the same sequence.
    pub fn forward(&mut self, xs: &[Tensor]) -> Result<Vec<Tensor>, EncoderError> {
        let mut ys = Vec::with_capacity(xs.len());
        self.states.reserve(xs.len());
        for x in xs {
            let s = self.params.step(x, self.states.last())?;
            ys.push(s.output().clone());
            self.states.push(s);
        }
        Ok(ys)
    }

    /// Most recent state, or `None` before anything was processed or seeded.
    pub fn last_state(&self) -> Option<&StepState> {
        self.states.last()
    }

    pub fn states(&self) -> &[StepState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Importance table over the recorded history (RAN only).
    pub fn importance(&self) -> Result<ImportanceTable, EncoderError> {
        attribute(&self.states)
    }

    pub fn into_states(self) -> Vec<StepState> {
        self.states
    }
}

/// Encode one sequence with a fresh encoder.
pub fn encode(
    params: &CellParams,
    inputs: &[Tensor],
    initial: Option<StepState>,
) -> Result<Encoded, EncoderError> {
    let mut encoder = SequenceEncoder::new(params);
    if let Some(state) = initial {
        encoder.set_initial_state(state)?;
    }
    let outputs = encoder.forward(inputs)?;
    Ok(Encoded {
        outputs,
        states: encoder.into_states(),
    })
}

/// Encode independent sequences in parallel, one encoder each.
///
/// Results keep the order of `batch`.
pub fn encode_batch(
    params: &CellParams,
    batch: &[Vec<Tensor>],
) -> Result<Vec<Encoded>, EncoderError> {
    tracing::debug!(sequences = batch.len(), cell = %params.kind(), "encoding batch");
    batch
        .par_iter()
        .map(|inputs| encode(params, inputs, None))
        .collect()
}
