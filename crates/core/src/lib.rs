//! # seqlab-core: Recurrent Encoding Engine
//!
//! The gated recurrent cells and everything that runs over their state
//! history:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ran`] | `RanParams`, `RanState`: Recurrent Additive Network step |
//! | [`deltarnn`] | `DeltaRnnParams`, `DeltaRnnState`: Delta-RNN step |
//! | [`cell`] | `CellParams` / `StepState`: closed variant dispatch |
//! | [`encoder`] | `SequenceEncoder`, `encode`, `encode_batch` |
//! | [`importance`] | `attribute`: backward importance table (RAN) |
//! | [`norm`] | `NormLayer` (LayerNorm / AdaNorm) |
//! | [`attention`] | `SyntheticAttention`: position-table attention over outputs |
//! | [`error`] | `EncoderError` |
//!
//! ## Design principles
//!
//! 1. **Candle all the way.** Steps only issue `candle-core` tensor ops; the
//!    engine owns gradients and device placement.
//! 2. **One encoder per sequence.** State history lives in a caller-owned
//!    context, never in a shared processor.
//! 3. **Deterministic.** Same parameters + same inputs = same states.

pub mod attention;
pub mod cell;
pub mod deltarnn;
pub mod encoder;
pub mod error;
pub mod importance;
pub mod norm;
pub mod ran;

// ── Public re-exports ───────────────────────────────────────────────────────

pub use attention::{Attended, SyntheticAttention};
pub use cell::{CellParams, StepState};
pub use deltarnn::{DeltaRnnParams, DeltaRnnState};
pub use encoder::{encode, encode_batch, Encoded, SequenceEncoder};
pub use error::EncoderError;
pub use importance::{attribute, ImportanceTable};
pub use norm::{AdaNorm, NormLayer};
pub use ran::{RanParams, RanState};
