//! Token and label records shared by the decoder, runtime and CLI.

use serde::{Deserialize, Serialize};

/// Character offsets of a token or span in the original text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offsets {
    pub start: usize,
    pub end: usize,
}

impl Offsets {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A token's text with its offsets, as produced by the upstream tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub text: String,
    #[serde(flatten)]
    pub offsets: Offsets,
}

impl TokenSpan {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            offsets: Offsets::new(start, end),
        }
    }
}

/// A token (or merged entity span) with its assigned label.
///
/// Before merging `label` is a BIOES tag (`B-LOC`, `O`, ...); after merging
/// entity spans carry the bare type (`LOC`) and outside tokens keep `O`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLabel {
    pub text: String,
    #[serde(flatten)]
    pub offsets: Offsets,
    pub label: String,
}

impl TokenLabel {
    pub fn new(
        text: impl Into<String>,
        start: usize,
        end: usize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            offsets: Offsets::new(start, end),
            label: label.into(),
        }
    }

    /// Attach a label to a tokenizer span.
    pub fn from_span(span: &TokenSpan, label: impl Into<String>) -> Self {
        Self {
            text: span.text.clone(),
            offsets: span.offsets,
            label: label.into(),
        }
    }

    /// True for anything other than the outside tag `O`.
    pub fn is_entity(&self) -> bool {
        self.label != "O"
    }
}
