//! Pluggable learned components
//!
//! The scheduler and the classifier both work without any trained model.
//! This module provides the model strategies they can swap in once enough
//! outcome data has accumulated, plus the deterministic train/validation
//! split both retraining paths share.

mod centroid;
mod priority;

pub use centroid::NearestCentroid;
pub use priority::{ConstantModel, LinearModel, PriorityModel, MIN_TRAINING_SAMPLES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Summary of one retraining pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub validation_size: usize,

    /// Validation accuracy (classifier) or 1 - MSE (prioritizer)
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

/// Splits samples 80/20: every fifth sample goes to validation
pub fn train_validation_split<T: Clone>(samples: &[T]) -> (Vec<T>, Vec<T>) {
    let mut train = Vec::with_capacity(samples.len());
    let mut validation = Vec::with_capacity(samples.len() / 5 + 1);
    for (i, sample) in samples.iter().enumerate() {
        if i % 5 == 4 {
            validation.push(sample.clone());
        } else {
            train.push(sample.clone());
        }
    }
    (train, validation)
}

/// The most recent training samples, oldest dropped first once full
#[derive(Debug)]
pub struct SampleWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> SampleWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = T>) {
        for sample in samples {
            self.push(sample);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copies the window, oldest first, for a retraining job
    pub fn snapshot(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}

/// Fraction of `(predicted, actual)` pairs that agree; 0 for no pairs
pub fn accuracy<T: PartialEq>(pairs: impl IntoIterator<Item = (T, T)>) -> f64 {
    let mut total = 0usize;
    let mut correct = 0usize;
    for (predicted, actual) in pairs {
        total += 1;
        if predicted == actual {
            correct += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}
