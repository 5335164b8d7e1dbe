use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};

/// Multinomial logistic regression: `softmax(W·x + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    /// One row per class, one column per feature
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticModel {
    pub fn validate(&self, n_features: usize, n_classes: usize) -> PredictResult<()> {
        if self.coefficients.len() != n_classes || self.intercepts.len() != n_classes {
            return Err(PredictError::Model(format!(
                "logistic model has {} coefficient rows and {} intercepts for {n_classes} classes",
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != n_features) {
            return Err(PredictError::Model(format!(
                "logistic coefficient row has {} entries for {n_features} features",
                row.len()
            )));
        }
        Ok(())
    }

    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();
        softmax(&logits)
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let p = softmax(&[1000.0, 1000.0, 999.0]);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[0], p[1], epsilon = 1e-12);
        assert!(p[2] < p[0]);
    }

    #[test]
    fn zero_weights_give_uniform_probabilities() {
        let m = LogisticModel {
            coefficients: vec![vec![0.0; 2]; 3],
            intercepts: vec![0.0; 3],
        };
        for p in m.predict_proba(&[3.0, -1.0]) {
            assert_relative_eq!(p, 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn validate_catches_ragged_rows() {
        let m = LogisticModel {
            coefficients: vec![vec![0.0; 2], vec![0.0; 1], vec![0.0; 2]],
            intercepts: vec![0.0; 3],
        };
        assert!(m.validate(2, 3).is_err());
        assert!(m.validate(2, 4).is_err());
    }
}
