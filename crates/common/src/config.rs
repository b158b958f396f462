//! Model configuration for the sequence labeler.
//!
//! Serialised as JSON next to the weights. Every optional field has a
//! sensible default so older config files keep loading.

use serde::{Deserialize, Serialize};

/// Which gated recurrent cell encodes the token vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Recurrent Additive Network.
    Ran,
    /// Delta-RNN (multiplicative-integration recurrence).
    DeltaRnn,
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ran => f.write_str("ran"),
            Self::DeltaRnn => f.write_str("delta_rnn"),
        }
    }
}

/// Optional normalisation applied to every encoder output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormKind {
    LayerNorm,
    AdaNorm,
}

/// Synthetic attention over the encoder outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticAttentionConfig {
    /// Width of the rectified feature map scored against the position rows.
    pub hidden_size: usize,
    /// Width of each context vector.
    pub value_size: usize,
    /// Longest sequence the position table covers.
    pub max_length: usize,
}

/// Configuration for the encoder → scorer → decoder pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelerConfig {
    // ── Encoder ─────────────────────────────────────────────────────────────
    /// Recurrent cell variant.
    pub cell: CellKind,
    /// Size of each incoming token vector.
    pub input_size: usize,
    /// Size of the recurrent output (and cell) vector.
    pub hidden_size: usize,
    /// Normalisation applied to encoder outputs before scoring.
    #[serde(default)]
    pub output_norm: Option<NormKind>,
    /// LayerNorm epsilon.
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    /// AdaNorm scale constant `C`.
    #[serde(default = "default_ada_norm_scale")]
    pub ada_norm_scale: f64,
    /// Synthetic attention between normalisation and scoring.
    #[serde(default)]
    pub attention: Option<SyntheticAttentionConfig>,

    // ── Labels ──────────────────────────────────────────────────────────────
    /// BIOES label set; index `i` is the scorer's output `i`.
    pub labels: Vec<String>,
    /// Merge `B…E` runs into single entity spans.
    #[serde(default = "default_true")]
    pub merge_entities: bool,
    /// Drop every output tagged exactly `O`.
    #[serde(default)]
    pub filter_non_entities: bool,
}

fn default_layer_norm_eps() -> f64 {
    1e-5
}
fn default_ada_norm_scale() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            cell: CellKind::Ran,
            input_size: 100,
            hidden_size: 100,
            output_norm: None,
            layer_norm_eps: 1e-5,
            ada_norm_scale: 1.0,
            attention: None,
            labels: ["O", "B-PER", "I-PER", "E-PER", "S-PER"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            merge_entities: true,
            filter_non_entities: false,
        }
    }
}

impl LabelerConfig {
    /// Number of labels the scorer predicts over.
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Width of the vectors the scorer sees.
    pub fn scorer_input_size(&self) -> usize {
        self.attention.map_or(self.hidden_size, |a| a.value_size)
    }

    /// Reject configurations no model can be built from.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.input_size == 0 || self.hidden_size == 0 {
            anyhow::bail!(
                "input_size ({}) and hidden_size ({}) must be non-zero",
                self.input_size,
                self.hidden_size
            );
        }
        if let Some(a) = &self.attention {
            if a.hidden_size == 0 || a.value_size == 0 || a.max_length == 0 {
                anyhow::bail!("attention sizes must be non-zero: {a:?}");
            }
        }
        if self.labels.is_empty() {
            anyhow::bail!("label set is empty");
        }
        Ok(())
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_json_round_trip() {
        let config = LabelerConfig {
            cell: CellKind::DeltaRnn,
            output_norm: Some(NormKind::AdaNorm),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let loaded: LabelerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.cell, CellKind::DeltaRnn);
        assert_eq!(loaded.output_norm, Some(NormKind::AdaNorm));
        assert_eq!(loaded.labels, config.labels);
        assert_eq!(loaded.hidden_size, config.hidden_size);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{
            "cell": "ran",
            "input_size": 8,
            "hidden_size": 4,
            "labels": ["O", "S-LOC"]
        }"#;
        let loaded: LabelerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(loaded.cell, CellKind::Ran);
        assert!(loaded.output_norm.is_none());
        assert!(loaded.attention.is_none());
        assert!(loaded.merge_entities);
        assert!(!loaded.filter_non_entities);
        assert_eq!(loaded.layer_norm_eps, 1e-5);
        assert_eq!(loaded.num_labels(), 2);
    }

    #[test]
    fn cell_kind_names() {
        let kind: CellKind = serde_json::from_str("\"delta_rnn\"").unwrap();
        assert_eq!(kind, CellKind::DeltaRnn);
        assert_eq!(kind.to_string(), "delta_rnn");
    }

    #[test]
    fn validate_rejects_empty_labels() {
        let config = LabelerConfig {
            labels: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LabelerConfig {
            hidden_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(LabelerConfig::default().validate().is_ok());
    }

    #[test]
    fn attention_changes_scorer_width() {
        let json = r#"{
            "cell": "ran",
            "input_size": 8,
            "hidden_size": 4,
            "attention": { "hidden_size": 6, "value_size": 3, "max_length": 32 },
            "labels": ["O"]
        }"#;
        let loaded: LabelerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(loaded.attention.map(|a| a.max_length), Some(32));
        assert_eq!(loaded.scorer_input_size(), 3);
        assert_eq!(LabelerConfig::default().scorer_input_size(), 100);

        let broken = LabelerConfig {
            attention: Some(SyntheticAttentionConfig {
                hidden_size: 6,
                value_size: 3,
                max_length: 0,
            }),
            ..Default::default()
        };
        assert!(broken.validate().is_err());
    }
}
