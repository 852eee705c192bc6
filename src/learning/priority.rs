//! Crawl value prediction models for the scheduler

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Predicts the expected value of crawling a URL from its feature vector
///
/// `is_trained` is the capability flag the scheduler checks before letting a
/// prediction overwrite a caller-supplied priority.
pub trait PriorityModel: Send + Sync + Debug {
    /// Predicted value in [0, 1]
    fn predict(&self, features: &[f64]) -> f64;

    fn is_trained(&self) -> bool;

    fn name(&self) -> &'static str;

    /// Serialized form for storage; untrained models have none
    fn export(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Always-available fallback that predicts 0.5 for everything
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantModel;

impl PriorityModel for ConstantModel {
    fn predict(&self, _features: &[f64]) -> f64 {
        0.5
    }

    fn is_trained(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

/// Linear regressor over standardized features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
    means: Vec<f64>,
    scales: Vec<f64>,
    pub trained_on: usize,
}

/// Minimum number of samples needed to fit a `LinearModel`
pub const MIN_TRAINING_SAMPLES: usize = 10;

const EPOCHS: usize = 400;
const LEARNING_RATE: f64 = 0.05;

impl LinearModel {
    /// Fits the model with batch gradient descent on squared error
    ///
    /// # Arguments
    ///
    /// * `samples` - `(features, target)` pairs; all feature vectors must have equal length
    ///
    /// # Returns
    ///
    /// * `Some(LinearModel)` - When at least `MIN_TRAINING_SAMPLES` consistent samples were given
    /// * `None` - Too few samples or inconsistent feature lengths
    pub fn fit(samples: &[(Vec<f64>, f64)]) -> Option<Self> {
        if samples.len() < MIN_TRAINING_SAMPLES {
            return None;
        }
        let dim = samples[0].0.len();
        if dim == 0 || samples.iter().any(|(x, _)| x.len() != dim) {
            return None;
        }

        let n = samples.len() as f64;
        let mut means = vec![0.0; dim];
        for (x, _) in samples {
            for (m, v) in means.iter_mut().zip(x) {
                *m += v / n;
            }
        }
        let mut scales = vec![0.0; dim];
        for (x, _) in samples {
            for ((s, v), m) in scales.iter_mut().zip(x).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in scales.iter_mut() {
            *s = if *s > 1e-12 { s.sqrt() } else { 1.0 };
        }

        let standardized: Vec<(Vec<f64>, f64)> = samples
            .iter()
            .map(|(x, y)| (standardize(x, &means, &scales), *y))
            .collect();

        let mut weights = vec![0.0; dim];
        let mut bias = standardized.iter().map(|(_, y)| y).sum::<f64>() / n;

        for _ in 0..EPOCHS {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;
            for (x, y) in &standardized {
                let err = dot(&weights, x) + bias - y;
                for (g, v) in grad_w.iter_mut().zip(x) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= LEARNING_RATE * g / n;
            }
            bias -= LEARNING_RATE * grad_b / n;
        }

        Some(Self {
            weights,
            bias,
            means,
            scales,
            trained_on: samples.len(),
        })
    }

    /// Mean squared error of the clamped predictions over `samples`
    pub fn mean_squared_error(&self, samples: &[(Vec<f64>, f64)]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples
            .iter()
            .map(|(x, y)| (self.predict(x) - y).powi(2))
            .sum::<f64>()
            / samples.len() as f64
    }

    pub fn dimension(&self) -> usize {
        self.weights.len()
    }
}

impl PriorityModel for LinearModel {
    fn predict(&self, features: &[f64]) -> f64 {
        if features.len() != self.weights.len() {
            return 0.5;
        }
        let x = standardize(features, &self.means, &self.scales);
        (dot(&self.weights, &x) + self.bias).clamp(0.0, 1.0)
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "linear"
    }

    fn export(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

fn standardize(x: &[f64], means: &[f64], scales: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(means)
        .zip(scales)
        .map(|((v, m), s)| (v - m) / s)
        .collect()
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_samples(n: usize) -> Vec<(Vec<f64>, f64)> {
        (0..n)
            .map(|i| {
                let a = (i % 10) as f64 / 10.0;
                let b = ((i * 7) % 5) as f64;
                (vec![a, b], 0.1 + 0.8 * a)
            })
            .collect()
    }

    #[test]
    fn test_constant_model() {
        let model = ConstantModel;
        assert_eq!(model.predict(&[1.0, 2.0]), 0.5);
        assert_eq!(model.predict(&[]), 0.5);
        assert!(!model.is_trained());
    }

    #[test]
    fn test_fit_requires_enough_samples() {
        assert!(LinearModel::fit(&linear_samples(MIN_TRAINING_SAMPLES - 1)).is_none());
        assert!(LinearModel::fit(&linear_samples(MIN_TRAINING_SAMPLES)).is_some());
    }

    #[test]
    fn test_fit_rejects_ragged_features() {
        let mut samples = linear_samples(12);
        samples[3].0.push(1.0);
        assert!(LinearModel::fit(&samples).is_none());
    }

    #[test]
    fn test_fit_learns_linear_relation() {
        let samples = linear_samples(50);
        let model = LinearModel::fit(&samples).unwrap();

        assert!(model.is_trained());
        assert_eq!(model.dimension(), 2);
        assert!(model.mean_squared_error(&samples) < 0.01);
        assert!(model.predict(&[0.9, 1.0]) > model.predict(&[0.1, 1.0]));
    }

    #[test]
    fn test_prediction_is_clamped() {
        let model = LinearModel::fit(&linear_samples(50)).unwrap();
        let high = model.predict(&[100.0, 0.0]);
        let low = model.predict(&[-100.0, 0.0]);
        assert_eq!(high, 1.0);
        assert_eq!(low, 0.0);
    }

    #[test]
    fn test_wrong_dimension_falls_back() {
        let model = LinearModel::fit(&linear_samples(20)).unwrap();
        assert_eq!(model.predict(&[0.5]), 0.5);
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let model = LinearModel::fit(&linear_samples(30)).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: LinearModel = serde_json::from_str(&json).unwrap();
        assert!((model.predict(&[0.3, 2.0]) - restored.predict(&[0.3, 2.0])).abs() < 1e-12);
    }
}
