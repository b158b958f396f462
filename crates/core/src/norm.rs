//! Normalisation layers applied to encoder outputs.
//!
//! Both layers work on a single rank-1 vector and use the statistics of that
//! vector only, so they run per time step with no sequence dependency.

use candle_core::{Result, Tensor};
use candle_nn::{layer_norm, LayerNorm, Module, VarBuilder};

use seqlab_common::{LabelerConfig, NormKind};

/// Added to the standard deviation in AdaNorm to avoid division by zero.
const ADA_NORM_EPS: f64 = 1e-10;
/// AdaNorm's `k` constant.
const ADA_NORM_K: f64 = 0.1;

/// AdaNorm (Xu et al., 2019): layer norm without gain/bias whose adaptive
/// scale `φ = C · (1 − k·y)` is treated as a constant in the backward pass.
pub struct AdaNorm {
    scale: f64,
}

impl AdaNorm {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mean = x.mean_all()?;
        let dev = x.broadcast_sub(&mean)?;
        let std = dev.sqr()?.mean_all()?.sqrt()?;
        let y = dev.broadcast_div(&std.affine(1.0, ADA_NORM_EPS)?)?;
        let phi = y.affine(-ADA_NORM_K, 1.0)?.affine(self.scale, 0.0)?;
        // stop-gradient on φ
        y.mul(&phi.detach())
    }
}

/// Normalisation layer selected by [`LabelerConfig::output_norm`].
///
/// LayerNorm is candle's (`(x − E[x]) / sqrt(Var[x] + eps) ⊙ w + b`).
pub enum NormLayer {
    LayerNorm(LayerNorm),
    AdaNorm(AdaNorm),
}

impl NormLayer {
    /// Construct from config. `vb` should be scoped to the layer prefix
    /// (e.g. `vb.pp("norm")`).
    pub fn new(kind: NormKind, config: &LabelerConfig, vb: VarBuilder) -> Result<Self> {
        match kind {
            NormKind::LayerNorm => Ok(Self::LayerNorm(layer_norm(
                config.hidden_size,
                config.layer_norm_eps,
                vb,
            )?)),
            NormKind::AdaNorm => Ok(Self::AdaNorm(AdaNorm::new(config.ada_norm_scale))),
        }
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        match self {
            Self::LayerNorm(l) => l.forward(x),
            Self::AdaNorm(a) => a.forward(x),
        }
    }

    /// Normalise every vector of a sequence.
    pub fn forward_all(&self, xs: &[Tensor]) -> Result<Vec<Tensor>> {
        xs.iter().map(|x| self.forward(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn assert_close(a: &[f32], b: &[f32], tol: f32) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < tol, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn layer_norm_standardises() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = LabelerConfig {
            hidden_size: 4,
            ..Default::default()
        };
        let norm = NormLayer::new(NormKind::LayerNorm, &config, vb.pp("norm")).unwrap();
        let x = Tensor::new(&[1f32, 2., 3., 6.], &Device::Cpu).unwrap();
        let y: Vec<f32> = norm.forward(&x).unwrap().to_vec1().unwrap();

        let mean: f32 = y.iter().sum::<f32>() / 4.0;
        let var: f32 = y.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 4.0;
        assert!(mean.abs() < 1e-5);
        assert!((var - 1.0).abs() < 1e-3);
        assert_eq!(varmap.all_vars().len(), 2);
    }

    #[test]
    fn layer_norm_matches_closed_form() {
        // mean 3, var 3.5
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = LabelerConfig {
            hidden_size: 4,
            ..Default::default()
        };
        let norm = NormLayer::new(NormKind::LayerNorm, &config, vb).unwrap();
        let x = Tensor::new(&[1f32, 2., 3., 6.], &Device::Cpu).unwrap();
        let y: Vec<f32> = norm.forward(&x).unwrap().to_vec1().unwrap();
        assert_close(&y, &[-1.069_043_4, -0.534_521_7, 0.0, 1.603_565_2], 1e-4);
    }

    #[test]
    fn ada_norm_matches_closed_form() {
        // mean 2, std √(2/3); y = [-√1.5, 0, √1.5]; z = y − 0.1·y²
        let x = Tensor::new(&[1f32, 2., 3.], &Device::Cpu).unwrap();
        let z: Vec<f32> = AdaNorm::new(1.0).forward(&x).unwrap().to_vec1().unwrap();
        assert_close(&z, &[-1.374_745, 0.0, 1.074_745], 1e-4);
    }

    #[test]
    fn ada_norm_scale_multiplies() {
        let x = Tensor::new(&[1f32, 2., 3.], &Device::Cpu).unwrap();
        let one: Vec<f32> = AdaNorm::new(1.0).forward(&x).unwrap().to_vec1().unwrap();
        let two: Vec<f32> = AdaNorm::new(2.0).forward(&x).unwrap().to_vec1().unwrap();
        let doubled: Vec<f32> = one.iter().map(|v| v * 2.0).collect();
        assert_close(&two, &doubled, 1e-5);
    }

    #[test]
    fn forward_all_keeps_length() {
        let norm = NormLayer::AdaNorm(AdaNorm::new(1.0));
        let xs = vec![
            Tensor::new(&[0f32, 1.], &Device::Cpu).unwrap(),
            Tensor::new(&[3f32, -1.], &Device::Cpu).unwrap(),
        ];
        assert_eq!(norm.forward_all(&xs).unwrap().len(), 2);
    }
}
