//! # seqlab-common: Shared Primitives
//!
//! Types and utilities shared across every crate in the workspace:
//!
//! * **[`LabelerConfig`]**: model hyper-parameters (serialised as JSON).
//! * **[`CellKind`]** / **[`NormKind`]**: resolved architecture choices.
//! * **[`TokenSpan`]** / **[`TokenLabel`]**: tokens with offsets and tags.
//! * **[`SequenceInput`]** / **[`vectors_to_tensors`]**: input records → Candle tensors.

pub mod config;
pub mod data;
pub mod labels;

pub use config::{CellKind, LabelerConfig, NormKind, SyntheticAttentionConfig};
pub use data::{load_sequences, load_token_labels, vectors_to_tensors, SequenceInput};
pub use labels::{Offsets, TokenLabel, TokenSpan};
