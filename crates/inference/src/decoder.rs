//! BIOES label decoding: merge `B…E` runs into entity spans, drop `O`.
//!
//! Tags are `O`, or a position prefix `S`/`B`/`I`/`E` followed by `-<type>`.
//! Merging is a single left-to-right pass with one accumulator:
//!
//! | Tag | Effect |
//! |-----|--------|
//! | `O` | emit the token unchanged |
//! | `S-T` | emit the token with label `T` |
//! | `B-T` | reset the accumulator to this token, type `T` |
//! | `I-T` | append `" " + text` to the accumulator |
//! | `E-T` | append, take this token's end offset, emit the accumulator |
//!
//! Malformed runs are tolerated: an `I`/`E` with no open entity works on
//! whatever the accumulator still holds (empty, or the previous entity).
//! Unrecognised tags emit nothing. Both cases are logged, never fatal.

use seqlab_common::{Offsets, TokenLabel, TokenSpan};

/// A parsed BIOES tag borrowing its entity type from the label string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag<'a> {
    Outside,
    Single(&'a str),
    Begin(&'a str),
    Inside(&'a str),
    End(&'a str),
    Unknown,
}

impl<'a> Tag<'a> {
    /// Classify by the first character; the type is whatever follows `X-`.
    pub fn parse(label: &'a str) -> Self {
        let ty = label.get(2..).unwrap_or("");
        match label.as_bytes().first() {
            Some(b'O') => Self::Outside,
            Some(b'S') => Self::Single(ty),
            Some(b'B') => Self::Begin(ty),
            Some(b'I') => Self::Inside(ty),
            Some(b'E') => Self::End(ty),
            _ => Self::Unknown,
        }
    }
}

/// In-progress entity. Not cleared after `E`.
#[derive(Debug, Default)]
struct Accumulator {
    text: String,
    label: String,
    offsets: Offsets,
    open: bool,
}

impl Accumulator {
    fn begin(&mut self, token: &TokenLabel, ty: &str) {
        self.text.clear();
        self.text.push_str(&token.text);
        self.label = ty.to_string();
        self.offsets = Offsets::new(token.offsets.start, 0);
        self.open = true;
    }

    fn extend(&mut self, token: &TokenLabel) {
        if !self.open {
            tracing::warn!(
                token = %token.text,
                label = %token.label,
                start = token.offsets.start,
                "continuation tag without a preceding B; using stale accumulator"
            );
        }
        self.text.push(' ');
        self.text.push_str(&token.text);
    }

    fn finish(&mut self, token: &TokenLabel) -> TokenLabel {
        self.offsets.end = token.offsets.end;
        self.open = false;
        TokenLabel {
            text: self.text.clone(),
            offsets: self.offsets,
            label: self.label.clone(),
        }
    }
}

/// Merge multi-token entities; order is preserved.
pub fn merge_entities(tokens: &[TokenLabel]) -> Vec<TokenLabel> {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut acc = Accumulator::default();
    for token in tokens {
        match Tag::parse(&token.label) {
            Tag::Outside => merged.push(token.clone()),
            Tag::Single(ty) => merged.push(TokenLabel {
                label: ty.to_string(),
                ..token.clone()
            }),
            Tag::Begin(ty) => acc.begin(token, ty),
            Tag::Inside(_) => acc.extend(token),
            Tag::End(_) => {
                acc.extend(token);
                merged.push(acc.finish(token));
            }
            Tag::Unknown => {
                tracing::warn!(
                    label = %token.label,
                    token = %token.text,
                    "unrecognised tag, token dropped"
                );
            }
        }
    }
    merged
}

/// Keep only outputs whose label is not exactly `O`.
pub fn filter_non_entities(tokens: Vec<TokenLabel>) -> Vec<TokenLabel> {
    tokens.into_iter().filter(TokenLabel::is_entity).collect()
}

/// Merge and/or filter a tagged token sequence.
pub fn decode(tokens: Vec<TokenLabel>, merge: bool, filter: bool) -> Vec<TokenLabel> {
    let tokens = if merge { merge_entities(&tokens) } else { tokens };
    if filter {
        filter_non_entities(tokens)
    } else {
        tokens
    }
}

/// Pair tokenizer spans with predicted label indices.
pub fn label_tokens(
    spans: &[TokenSpan],
    indices: &[usize],
    labels: &[String],
) -> anyhow::Result<Vec<TokenLabel>> {
    if spans.len() != indices.len() {
        anyhow::bail!("{} tokens but {} predictions", spans.len(), indices.len());
    }
    spans
        .iter()
        .zip(indices)
        .map(|(span, &i)| {
            let label = labels.get(i).ok_or_else(|| {
                anyhow::anyhow!("label index {i} out of range ({} labels)", labels.len())
            })?;
            Ok(TokenLabel::from_span(span, label.as_str()))
        })
        .collect()
}
