//! Labeler runtime: token vectors in, decoded entity spans out.
//!
//! ```text
//! vectors → cell encoder → [norm] → [attention] → scorer → labels → BIOES decoder
//! ```
//!
//! Each sequence gets its own encoder, so a batch fans out across the rayon
//! pool with nothing shared but the read-only parameters.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use rayon::prelude::*;
use serde::Serialize;

use seqlab_common::{
    vectors_to_tensors, CellKind, LabelerConfig, SequenceInput, TokenLabel, TokenSpan,
};
use seqlab_core::{
    attribute, encode, CellParams, Encoded, ImportanceTable, NormLayer, SyntheticAttention,
};

use crate::decoder::{decode, label_tokens};
use crate::scorer::{GreedyScorer, Scorer};

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Output for one sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub labels: Vec<TokenLabel>,
    /// RAN importance table; `None` for other cells.
    pub importance: Option<ImportanceTable>,
    /// `attention[i][j]`: weight of token `j` for token `i`, when configured.
    pub attention: Option<Vec<Vec<f32>>>,
}

/// High-level sequence labeler.
pub struct SequenceLabeler {
    cell: CellParams,
    norm: Option<NormLayer>,
    attention: Option<SyntheticAttention>,
    scorer: Box<dyn Scorer>,
    varmap: VarMap,
    config: LabelerConfig,
    device: Device,
}

impl SequenceLabeler {
    /// Build a freshly initialised labeler.
    pub fn new(config: LabelerConfig, device: Device) -> anyhow::Result<Self> {
        config.validate()?;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let cell = CellParams::new(&config, vb.pp("cell"))?;
        let norm = config
            .output_norm
            .map(|kind| NormLayer::new(kind, &config, vb.pp("norm")))
            .transpose()?;
        let attention = config
            .attention
            .map(|a| SyntheticAttention::new(config.hidden_size, &a, vb.pp("attention")))
            .transpose()?;
        let scorer = GreedyScorer::new(
            config.scorer_input_size(),
            config.num_labels(),
            vb.pp("scorer"),
        )?;
        Ok(Self {
            cell,
            norm,
            attention,
            scorer: Box::new(scorer),
            varmap,
            config,
            device,
        })
    }

    /// Load `config.json` and `model.safetensors` from `model_dir`.
    pub fn load(model_dir: &Path, device: Device) -> anyhow::Result<Self> {
        let config = LabelerConfig::load(&model_dir.join(CONFIG_FILE))?;
        let mut labeler = Self::new(config, device)?;
        labeler.varmap.load(model_dir.join(WEIGHTS_FILE))?;
        tracing::info!(
            model_dir = %model_dir.display(),
            cell = %labeler.config.cell,
            labels = labeler.config.num_labels(),
            "labeler loaded"
        );
        Ok(labeler)
    }

    /// Write `config.json` and `model.safetensors` into `model_dir`.
    pub fn save(&self, model_dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(model_dir)?;
        self.config.save(&model_dir.join(CONFIG_FILE))?;
        self.varmap.save(model_dir.join(WEIGHTS_FILE))?;
        Ok(())
    }

    /// Replace the built-in greedy scorer (e.g. with a CRF decoder).
    pub fn with_scorer(mut self, scorer: Box<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Override the config's merge/filter settings for later calls.
    pub fn set_decode_options(&mut self, merge: bool, filter: bool) {
        self.config.merge_entities = merge;
        self.config.filter_non_entities = filter;
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    pub fn cell(&self) -> &CellParams {
        &self.cell
    }

    /// Hidden vectors for one sequence, after the optional norm layer.
    pub fn hidden(&self, vectors: &[Tensor]) -> anyhow::Result<(Vec<Tensor>, Encoded)> {
        let encoded = encode(&self.cell, vectors, None)?;
        let hidden = match &self.norm {
            Some(norm) => norm.forward_all(&encoded.outputs)?,
            None => encoded.outputs.clone(),
        };
        Ok((hidden, encoded))
    }

    /// Label one sequence.
    pub fn analyze(
        &self,
        tokens: &[TokenSpan],
        vectors: &[Tensor],
        merge: bool,
        filter: bool,
    ) -> anyhow::Result<Analysis> {
        if tokens.len() != vectors.len() {
            anyhow::bail!("{} tokens but {} vectors", tokens.len(), vectors.len());
        }
        let (mut hidden, encoded) = self.hidden(vectors)?;
        let attention = match &self.attention {
            Some(layer) => {
                let attended = layer.forward(&hidden)?;
                hidden = attended.context;
                let probs = attended
                    .probs
                    .iter()
                    .map(|p| p.to_vec1::<f32>())
                    .collect::<candle_core::Result<Vec<_>>>()?;
                Some(probs)
            }
            None => None,
        };
        let indices = self.scorer.predict(&hidden)?;
        let tagged = label_tokens(tokens, &indices, &self.config.labels)?;
        let importance = match self.cell.kind() {
            CellKind::Ran => Some(attribute(&encoded.states)?),
            CellKind::DeltaRnn => None,
        };
        Ok(Analysis {
            labels: decode(tagged, merge, filter),
            importance,
            attention,
        })
    }

    /// Label one input record with the config's merge/filter settings.
    pub fn analyze_input(&self, input: &SequenceInput) -> anyhow::Result<Analysis> {
        input.validate(self.config.input_size)?;
        let vectors = vectors_to_tensors(&input.vectors, &self.device)?;
        self.analyze(
            &input.tokens,
            &vectors,
            self.config.merge_entities,
            self.config.filter_non_entities,
        )
    }

    /// Label independent sequences in parallel. Output order matches `inputs`.
    pub fn analyze_batch(&self, inputs: &[SequenceInput]) -> anyhow::Result<Vec<Analysis>> {
        tracing::debug!(sequences = inputs.len(), "analyzing batch");
        inputs
            .par_iter()
            .map(|input| self.analyze_input(input))
            .collect()
    }
}
