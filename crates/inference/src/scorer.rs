//! Emission scoring: hidden vectors → label indices.
//!
//! The CRF lives outside this workspace; anything implementing [`Scorer`]
//! can be plugged into the runtime. [`GreedyScorer`] is a linear projection
//! followed by a per-token argmax.

use candle_core::{Result, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};

/// Predicts one label index per hidden vector.
pub trait Scorer: Send + Sync {
    fn predict(&self, hidden: &[Tensor]) -> Result<Vec<usize>>;
}

/// Linear emission scores with greedy (per-token argmax) decoding.
pub struct GreedyScorer {
    proj: Linear,
}

impl GreedyScorer {
    pub fn new(in_dim: usize, num_labels: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            proj: candle_nn::linear(in_dim, num_labels, vb)?,
        })
    }

    pub fn from_linear(proj: Linear) -> Self {
        Self { proj }
    }

    /// Emission scores of shape `(seq_len, num_labels)`.
    pub fn emissions(&self, hidden: &[Tensor]) -> Result<Tensor> {
        let h = Tensor::stack(hidden, 0)?;
        self.proj.forward(&h)
    }
}

impl Scorer for GreedyScorer {
    fn predict(&self, hidden: &[Tensor]) -> Result<Vec<usize>> {
        if hidden.is_empty() {
            return Ok(Vec::new());
        }
        let best: Vec<u32> = self.emissions(hidden)?.argmax(D::Minus1)?.to_vec1()?;
        Ok(best.into_iter().map(|i| i as usize).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn argmax_per_token() {
        let dev = Device::Cpu;
        // 3 labels over 2-d hidden vectors: label 0 ← h0, label 1 ← h1, label 2 ← -h0
        let w = Tensor::new(&[[1f32, 0.], [0., 1.], [-1., 0.]], &dev).unwrap();
        let b = Tensor::new(&[0f32, 0., 0.], &dev).unwrap();
        let scorer = GreedyScorer::from_linear(Linear::new(w, Some(b)));

        let hidden = vec![
            Tensor::new(&[0.9f32, 0.1], &dev).unwrap(),
            Tensor::new(&[0.1f32, 0.8], &dev).unwrap(),
            Tensor::new(&[-0.7f32, 0.2], &dev).unwrap(),
        ];
        assert_eq!(scorer.emissions(&hidden).unwrap().dims(), &[3, 3]);
        assert_eq!(scorer.predict(&hidden).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn empty_sequence_predicts_nothing() {
        let dev = Device::Cpu;
        let w = Tensor::new(&[[1f32, 0.]], &dev).unwrap();
        let scorer = GreedyScorer::from_linear(Linear::new(w, None));
        assert!(scorer.predict(&[]).unwrap().is_empty());
    }
}
