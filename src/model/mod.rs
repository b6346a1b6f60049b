//! Model Module - Vectorizer + Classifier Inference
//!
//! Artifacts are produced by the external training pipeline and loaded once
//! at startup. Everything here is read-only after construction.

pub mod artifacts;
pub mod classifier;
pub mod predictor;
pub mod vectorizer;

use thiserror::Error;

// Re-export common types
pub use artifacts::{load_predictor, ModelInfo};
pub use predictor::{Prediction, Predictor};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Sparse feature row. Entries are sorted by column and columns are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Build from `(column, value)` pairs. Pairs are sorted; zero values dropped.
    pub fn new(dim: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|&(_, v)| v != 0.0);
        entries.sort_unstable_by_key(|&(col, _)| col);
        Self { dim, entries }
    }

    #[cfg(test)]
    pub fn empty(dim: usize) -> Self {
        Self { dim, entries: Vec::new() }
    }

    /// Total number of columns (vocabulary size)
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of non-zero columns
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Dot product with a dense weight row
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter()
            .map(|(col, v)| weights.get(col).copied().unwrap_or(0.0) * v)
            .sum()
    }

    #[cfg(test)]
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for &(col, v) in &self.entries {
            if let Some(slot) = dense.get_mut(col) {
                *slot = v;
            }
        }
        dense
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Maps cleaned text to a fixed-dimension feature row.
pub trait Vectorizer: Send + Sync {
    fn kind(&self) -> &'static str;
    fn n_features(&self) -> usize;
    fn transform(&self, text: &str) -> FeatureVector;
}

/// Binary classifier over feature rows.
///
/// `predict_proba` returns one probability per class, in the order of the
/// classifier's class labels.
pub trait Classifier: Send + Sync {
    fn kind(&self) -> &'static str;
    fn n_features(&self) -> usize;
    fn classes(&self) -> &[i64];
    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError>;
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError>;
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Startup failure while loading or validating artifacts
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    DimensionMismatch { vectorizer: usize, classifier: usize },
}

/// Per-request failure inside the vectorizer/classifier pair
#[derive(Debug, Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);
