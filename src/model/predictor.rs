//! Prediction Service
//!
//! clean_text → vectorizer.transform → classifier.predict / predict_proba.
//! The label is the classifier's own decision; probabilities are reported
//! verbatim, index 0 = safe, index 1 = hate.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::{Classifier, InferenceError, ModelError, ModelInfo, Vectorizer};
use crate::text::clean_text;

/// Class label the training pipeline assigned to hate speech
pub const HATE_CLASS: i64 = 1;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "Hate Speech")]
    Hate,
    #[serde(rename = "Safe Speech")]
    Safe,
}

impl Verdict {
    pub fn from_class(class: i64) -> Self {
        if class == HATE_CLASS {
            Verdict::Hate
        } else {
            Verdict::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Hate => "Hate Speech",
            Verdict::Safe => "Safe Speech",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    pub safe: f64,
    pub hate: f64,
}

/// Response body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub cleaned_text: String,
    pub prediction: Verdict,
    pub probabilities: Probabilities,
}

// ============================================================================
// PREDICTOR
// ============================================================================

/// Immutable vectorizer/classifier pair shared by all request handlers
pub struct Predictor {
    vectorizer: Box<dyn Vectorizer>,
    classifier: Box<dyn Classifier>,
    info: ModelInfo,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor").field("info", &self.info).finish()
    }
}

impl Predictor {
    /// Pair a vectorizer with a classifier. Their feature counts must agree.
    pub fn new(
        vectorizer: Box<dyn Vectorizer>,
        classifier: Box<dyn Classifier>,
        info: ModelInfo,
    ) -> Result<Self, ModelError> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(ModelError::DimensionMismatch {
                vectorizer: vectorizer.n_features(),
                classifier: classifier.n_features(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Classify one raw text.
    pub fn predict(&self, text: &str) -> Result<Prediction, InferenceError> {
        let cleaned_text = clean_text(text);
        let features = self.vectorizer.transform(&cleaned_text);

        let label = self.classifier.predict(&features)?;
        let proba = self.classifier.predict_proba(&features)?;

        let [safe, hate] = <[f64; 2]>::try_from(proba).map_err(|p: Vec<f64>| {
            InferenceError(format!("expected 2 class probabilities, got {}", p.len()))
        })?;

        let prediction = Verdict::from_class(label);
        debug!(
            prediction = %prediction,
            hate_probability = hate,
            nnz = features.nnz(),
            "Text classified"
        );

        Ok(Prediction {
            cleaned_text,
            prediction,
            probabilities: Probabilities { safe, hate },
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
