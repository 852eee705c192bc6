//! Nearest-centroid classification over dense feature vectors

use crate::learning::priority::dot;
use crate::state::LinkCategory;
use serde::{Deserialize, Serialize};

/// Softmax sharpness applied to cosine similarities
const TEMPERATURE: f64 = 5.0;

/// One mean vector per category seen in training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    centroids: Vec<(LinkCategory, Vec<f64>)>,
}

impl NearestCentroid {
    /// Computes the per-category mean of the given samples
    ///
    /// Returns None when there are no samples or feature lengths disagree.
    pub fn fit(samples: &[(Vec<f64>, LinkCategory)]) -> Option<Self> {
        let dim = samples.first()?.0.len();
        if samples.iter().any(|(x, _)| x.len() != dim) {
            return None;
        }

        let mut sums: Vec<(LinkCategory, Vec<f64>, usize)> = Vec::new();
        for (x, category) in samples {
            let idx = match sums.iter().position(|(c, _, _)| c == category) {
                Some(idx) => idx,
                None => {
                    sums.push((*category, vec![0.0; dim], 0));
                    sums.len() - 1
                }
            };
            let entry = &mut sums[idx];
            for (s, v) in entry.1.iter_mut().zip(x) {
                *s += v;
            }
            entry.2 += 1;
        }

        let centroids = sums
            .into_iter()
            .map(|(category, sum, count)| {
                let mean = sum.into_iter().map(|s| s / count as f64).collect();
                (category, mean)
            })
            .collect();

        Some(Self { centroids })
    }

    /// Predicts the closest category by cosine similarity
    ///
    /// Confidence is the softmax weight of the winning centroid, so it drops
    /// toward `1 / k` when all centroids look alike.
    pub fn predict(&self, x: &[f64]) -> Option<(LinkCategory, f64)> {
        let sims: Vec<(LinkCategory, f64)> = self
            .centroids
            .iter()
            .filter(|(_, c)| c.len() == x.len())
            .map(|(category, c)| (*category, cosine(x, c)))
            .collect();

        let (best, best_sim) = sims
            .iter()
            .copied()
            .fold(None, |acc: Option<(LinkCategory, f64)>, cur| match acc {
                Some(a) if a.1 >= cur.1 => Some(a),
                _ => Some(cur),
            })?;

        let denom: f64 = sims
            .iter()
            .map(|(_, s)| (TEMPERATURE * (s - best_sim)).exp())
            .sum();
        Some((best, (1.0 / denom).clamp(0.0, 1.0)))
    }

    pub fn categories(&self) -> Vec<LinkCategory> {
        self.centroids.iter().map(|(c, _)| *c).collect()
    }
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    if na < 1e-12 || nb < 1e-12 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}
