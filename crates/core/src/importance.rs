//! Importance attribution over a RAN state history.
//!
//! For step `i` and every `k ≤ i`:
//!
//! ```text
//! acc      = forG[i]
//! score[k] = max(inG[k] ⊙ acc)          for k = i, i-1, ..., 0
//! acc      = acc ⊙ forG[k]              after scoring k, when k > 0
//! ```
//!
//! `score[k]` is step `k`'s input gate discounted by the forgetting between
//! `k` and `i`. The table is ragged: row `i` has `i + 1` entries.

use candle_core::Tensor;

use crate::cell::StepState;
use crate::error::EncoderError;
use crate::ran::RanState;

/// Row `i` holds the scores of steps `0..=i` with respect to step `i`.
pub type ImportanceTable = Vec<Vec<f32>>;

/// Compute the importance table for a full RAN history.
pub fn attribute(states: &[StepState]) -> Result<ImportanceTable, EncoderError> {
    let ran = states
        .iter()
        .map(|s| s.as_ran().ok_or(EncoderError::AttributionUnsupported(s.kind())))
        .collect::<Result<Vec<_>, _>>()?;
    (0..ran.len()).map(|i| row_scores(&ran, i)).collect()
}

fn row_scores(states: &[&RanState], i: usize) -> Result<Vec<f32>, EncoderError> {
    let mut scores = vec![0f32; i + 1];
    let mut acc: Tensor = states[i].for_g.detach();
    for k in (0..=i).rev() {
        scores[k] = (&states[k].in_g * &acc)?.max(0)?.to_scalar::<f32>()?;
        if k > 0 {
            acc = (&acc * &states[k].for_g)?;
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    use crate::cell::CellParams;
    use crate::encoder::encode;

    fn t(v: &[f32]) -> Tensor {
        Tensor::new(v, &Device::Cpu).unwrap()
    }

    /// State with only the gates filled in; attribution reads nothing else.
    fn gates(in_g: &[f32], for_g: &[f32]) -> StepState {
        StepState::Ran(RanState {
            in_g: t(in_g),
            for_g: t(for_g),
            cand: t(&[0.0, 0.0]),
            c: t(&[0.0, 0.0]),
            y: t(&[0.0, 0.0]),
        })
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn hand_computed_table() {
        let states = vec![
            gates(&[0.5, 0.2], &[0.9, 0.1]),
            gates(&[0.3, 0.8], &[0.5, 0.5]),
            gates(&[0.6, 0.4], &[0.2, 1.0]),
        ];
        let table = attribute(&states).unwrap();
        assert_eq!(table.len(), 3);

        // Row 0: acc = f0 → max(i0 ⊙ f0) = max(0.45, 0.02)
        assert_close(&table[0], &[0.45]);

        // Row 1: acc = f1 = [0.5, 0.5]
        //   k=1: max(i1 ⊙ [0.5, 0.5]) = 0.4; acc ← [0.25, 0.25]
        //   k=0: max(i0 ⊙ [0.25, 0.25]) = 0.125
        assert_close(&table[1], &[0.125, 0.4]);

        // Row 2: acc = f2 = [0.2, 1.0]
        //   k=2: max([0.12, 0.4]) = 0.4; acc ← [0.04, 1.0]
        //   k=1: max([0.012, 0.8]) = 0.8; acc ← [0.02, 0.5]
        //   k=0: max([0.01, 0.1]) = 0.1
        assert_close(&table[2], &[0.1, 0.8, 0.4]);
    }

    #[test]
    fn diagonal_is_input_times_forget_gate() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let p = CellParams::ran(3, 6, vb).unwrap();
        let xs: Vec<Tensor> = (0..5)
            .map(|i| t(&[i as f32 * 0.3, 1.0 - i as f32 * 0.1, -0.5]))
            .collect();
        let enc = encode(&p, &xs, None).unwrap();
        let table = attribute(&enc.states).unwrap();

        assert_eq!(table.len(), 5);
        for (i, row) in table.iter().enumerate() {
            assert_eq!(row.len(), i + 1);
            let s = enc.states[i].as_ran().unwrap();
            let expected = (&s.in_g * &s.for_g)
                .unwrap()
                .max(0)
                .unwrap()
                .to_scalar::<f32>()
                .unwrap();
            assert_eq!(row[i], expected);
            for score in row {
                assert!((0.0..=1.0).contains(score));
            }
        }
    }

    #[test]
    fn empty_history_gives_empty_table() {
        assert!(attribute(&[]).unwrap().is_empty());
    }

    #[test]
    fn delta_rnn_history_is_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let p = CellParams::delta_rnn(3, 2, vb).unwrap();
        let enc = encode(&p, &[t(&[1.0, 0.0, 0.0])], None).unwrap();
        assert!(matches!(
            attribute(&enc.states),
            Err(EncoderError::AttributionUnsupported(_))
        ));
    }
}
