//! # seqlab-infer: Labeling Runtime
//!
//! * **[`decoder`]**: BIOES merge/filter over tagged tokens.
//! * **[`Scorer`]** / **[`GreedyScorer`]**: hidden vectors → label indices.
//! * **[`SequenceLabeler`]**: load model + label token sequences.

pub mod decoder;
pub mod runtime;
pub mod scorer;

pub use decoder::{decode, filter_non_entities, label_tokens, merge_entities, Tag};
pub use runtime::{Analysis, SequenceLabeler};
pub use scorer::{GreedyScorer, Scorer};
