//! Errors raised by the recurrent encoder.

use seqlab_common::CellKind;
use thiserror::Error;

/// Encoder failure.
///
/// `InitialStateAfterInput` and `VariantMismatch` are caller bugs (the
/// encoder was driven out of order or fed the wrong cell's state); the
/// remaining variants come from the data or the tensor engine.
#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("initial state must be set before any input ({processed} states already present)")]
    InitialStateAfterInput { processed: usize },

    #[error("state variant mismatch: cell is {expected}, state is {found}")]
    VariantMismatch { expected: CellKind, found: CellKind },

    #[error("input size mismatch: expected {expected}, got {found}")]
    InputSize { expected: usize, found: usize },

    #[error("importance attribution is only defined for ran states, got {0}")]
    AttributionUnsupported(CellKind),

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

impl EncoderError {
    /// True when the error signals misuse of the encoder API rather than bad data.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::InitialStateAfterInput { .. } | Self::VariantMismatch { .. }
        )
    }
}
