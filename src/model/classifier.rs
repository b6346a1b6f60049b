//! Binary Classifiers
//!
//! Linear models exported from the training pipeline. Output semantics follow
//! the fitted model: `predict` is the model's own decision rule and
//! `predict_proba` is ordered like `classes`.

use serde::Deserialize;

use super::{Classifier, FeatureVector, InferenceError, ModelError};

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

/// Weights may be exported flat (`[w0, w1, ..]`) or as a single-row matrix
/// (`[[w0, w1, ..]]`) straight from `coef_.tolist()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WeightRow {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

impl WeightRow {
    fn into_row(self) -> Result<Vec<f64>, ModelError> {
        match self {
            WeightRow::Flat(row) => Ok(row),
            WeightRow::Nested(mut rows) if rows.len() == 1 => Ok(rows.remove(0)),
            WeightRow::Nested(rows) => Err(ModelError::Invalid(format!(
                "expected a single weight row for a binary model, got {}",
                rows.len()
            ))),
        }
    }
}

/// Scalar or one-element list (`intercept_.tolist()`)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Value(f64),
    List(Vec<f64>),
}

impl Scalar {
    fn into_value(self) -> Result<f64, ModelError> {
        match self {
            Scalar::Value(v) => Ok(v),
            Scalar::List(list) if list.len() == 1 => Ok(list[0]),
            Scalar::List(list) => Err(ModelError::Invalid(format!(
                "expected a single intercept, got {}",
                list.len()
            ))),
        }
    }
}

/// Serialized classifier as exported by the training pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression {
        coef: WeightRow,
        intercept: Scalar,
        #[serde(default = "default_classes")]
        classes: Vec<i64>,
    },
    MultinomialNb {
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
        #[serde(default = "default_classes")]
        classes: Vec<i64>,
    },
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

impl ClassifierArtifact {
    /// Validate and build the classifier
    pub fn build(self) -> Result<Box<dyn Classifier>, ModelError> {
        match self {
            ClassifierArtifact::LogisticRegression { coef, intercept, classes } => Ok(Box::new(
                LogisticRegression::new(coef.into_row()?, intercept.into_value()?, classes)?,
            )),
            ClassifierArtifact::MultinomialNb { class_log_prior, feature_log_prob, classes } => Ok(
                Box::new(MultinomialNb::new(class_log_prior, feature_log_prob, classes)?),
            ),
        }
    }
}

fn binary_classes(classes: Vec<i64>) -> Result<[i64; 2], ModelError> {
    match classes.as_slice() {
        &[a, b] if a != b => Ok([a, b]),
        _ => Err(ModelError::Invalid(format!(
            "binary classifier needs two distinct classes, got {classes:?}"
        ))),
    }
}

fn check_dim(features: &FeatureVector, expected: usize) -> Result<(), InferenceError> {
    if features.dim() != expected {
        return Err(InferenceError(format!(
            "feature row has {} columns, model expects {}",
            features.dim(),
            expected
        )));
    }
    Ok(())
}

// ============================================================================
// LOGISTIC REGRESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
    classes: [i64; 2],
}

impl LogisticRegression {
    pub fn new(coef: Vec<f64>, intercept: f64, classes: Vec<i64>) -> Result<Self, ModelError> {
        if coef.is_empty() {
            return Err(ModelError::Invalid("logistic regression has no coefficients".to_string()));
        }
        Ok(Self {
            coef,
            intercept,
            classes: binary_classes(classes)?,
        })
    }

    /// Signed distance to the separating hyperplane
    pub fn decision_function(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        check_dim(features, self.coef.len())?;
        Ok(features.dot(&self.coef) + self.intercept)
    }
}

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError> {
        let decision = self.decision_function(features)?;
        Ok(if decision > 0.0 { self.classes[1] } else { self.classes[0] })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        let positive = sigmoid(self.decision_function(features)?);
        Ok(vec![1.0 - positive, positive])
    }
}

// ============================================================================
// MULTINOMIAL NAIVE BAYES
// ============================================================================

#[derive(Debug, Clone)]
pub struct MultinomialNb {
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
    classes: [i64; 2],
}

impl MultinomialNb {
    pub fn new(
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
        classes: Vec<i64>,
    ) -> Result<Self, ModelError> {
        let class_log_prior: [f64; 2] = class_log_prior.try_into().map_err(|v: Vec<f64>| {
            ModelError::Invalid(format!("class_log_prior needs 2 entries, got {}", v.len()))
        })?;
        let [neg, pos]: [Vec<f64>; 2] = feature_log_prob.try_into().map_err(|v: Vec<Vec<f64>>| {
            ModelError::Invalid(format!("feature_log_prob needs 2 rows, got {}", v.len()))
        })?;
        if neg.is_empty() || neg.len() != pos.len() {
            return Err(ModelError::Invalid(format!(
                "feature_log_prob rows must be non-empty and equal length ({} vs {})",
                neg.len(),
                pos.len()
            )));
        }
        Ok(Self {
            class_log_prior,
            feature_log_prob: [neg, pos],
            classes: binary_classes(classes)?,
        })
    }

    /// Joint log likelihood per class
    fn joint_log_likelihood(&self, features: &FeatureVector) -> Result<[f64; 2], InferenceError> {
        check_dim(features, self.feature_log_prob[0].len())?;
        Ok([
            self.class_log_prior[0] + features.dot(&self.feature_log_prob[0]),
            self.class_log_prior[1] + features.dot(&self.feature_log_prob[1]),
        ])
    }
}

impl Classifier for MultinomialNb {
    fn kind(&self) -> &'static str {
        "multinomial_nb"
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob[0].len()
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError> {
        let [neg, pos] = self.joint_log_likelihood(features)?;
        // ties go to the first class
        Ok(if pos > neg { self.classes[1] } else { self.classes[0] })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        let [neg, pos] = self.joint_log_likelihood(features)?;
        let max = neg.max(pos);
        let log_sum = max + ((neg - max).exp() + (pos - max).exp()).ln();
        Ok(vec![(neg - log_sum).exp(), (pos - log_sum).exp()])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lr() -> LogisticRegression {
        LogisticRegression::new(vec![2.0, -1.0, 0.0], -0.5, vec![0, 1]).unwrap()
    }

    #[test]
    fn test_sigmoid_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_regression_prediction() {
        let model = lr();

        let hateful = FeatureVector::new(3, vec![(0, 1.0)]);
        assert_eq!(model.predict(&hateful).unwrap(), 1);
        let proba = model.predict_proba(&hateful).unwrap();
        assert!((proba[1] - sigmoid(1.5)).abs() < 1e-12);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);

        let benign = FeatureVector::new(3, vec![(1, 1.0)]);
        assert_eq!(model.predict(&benign).unwrap(), 0);
        assert!(model.predict_proba(&benign).unwrap()[0] > 0.5);
    }

    #[test]
    fn test_logistic_regression_empty_row_uses_intercept() {
        let model = lr();
        let empty = FeatureVector::empty(3);
        assert_eq!(model.predict(&empty).unwrap(), 0);
        let proba = model.predict_proba(&empty).unwrap();
        assert!((proba[1] - sigmoid(-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_decision_at_zero_is_negative_class() {
        let model = LogisticRegression::new(vec![1.0], 0.0, vec![0, 1]).unwrap();
        let row = FeatureVector::empty(1);
        assert_eq!(model.predict(&row).unwrap(), 0);
        assert_eq!(model.predict_proba(&row).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_predict_agrees_with_proba() {
        let model = lr();
        for row in [
            FeatureVector::new(3, vec![(0, 0.3), (1, 0.2)]),
            FeatureVector::new(3, vec![(0, 0.1), (1, 0.9)]),
            FeatureVector::new(3, vec![(0, 5.0)]),
            FeatureVector::new(3, vec![(2, 4.0)]),
        ] {
            let label = model.predict(&row).unwrap();
            let proba = model.predict_proba(&row).unwrap();
            assert_eq!(label == 1, proba[1] > 0.5, "disagreement on {row:?}");
        }
    }

    #[test]
    fn test_dimension_mismatch_is_inference_error() {
        let model = lr();
        let row = FeatureVector::empty(7);
        assert!(model.predict(&row).is_err());
        assert!(model.predict_proba(&row).is_err());
    }

    #[test]
    fn test_custom_class_labels() {
        let model = LogisticRegression::new(vec![1.0], 0.0, vec![-1, 1]).unwrap();
        let row = FeatureVector::new(1, vec![(0, -2.0)]);
        assert_eq!(model.predict(&row).unwrap(), -1);
        assert_eq!(model.classes(), &[-1i64, 1]);
    }

    #[test]
    fn test_multinomial_nb() {
        let model = MultinomialNb::new(
            vec![(0.5f64).ln(), (0.5f64).ln()],
            vec![vec![(0.8f64).ln(), (0.2f64).ln()], vec![(0.2f64).ln(), (0.8f64).ln()]],
            vec![0, 1],
        )
        .unwrap();

        let row = FeatureVector::new(2, vec![(1, 2.0)]);
        assert_eq!(model.predict(&row).unwrap(), 1);
        let proba = model.predict_proba(&row).unwrap();
        // 0.5 * 0.8^2 vs 0.5 * 0.2^2 -> 0.64 / 0.68
        assert!((proba[1] - 0.64 / 0.68).abs() < 1e-9);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);

        let empty = FeatureVector::empty(2);
        assert_eq!(model.predict(&empty).unwrap(), 0);
        let proba = model.predict_proba(&empty).unwrap();
        assert!((proba[0] - 0.5).abs() < 1e-12);
        assert!((proba[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_artifact_formats() {
        let nested: ClassifierArtifact = serde_json::from_value(json!({
            "kind": "logistic_regression",
            "coef": [[1.0, 2.0]],
            "intercept": [0.25]
        }))
        .unwrap();
        let model = nested.build().unwrap();
        assert_eq!(model.kind(), "logistic_regression");
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.classes(), &[0i64, 1]);

        let flat: ClassifierArtifact = serde_json::from_value(json!({
            "kind": "logistic_regression",
            "coef": [1.0, 2.0, 3.0],
            "intercept": 0.0,
            "classes": [0, 1]
        }))
        .unwrap();
        assert_eq!(flat.build().unwrap().n_features(), 3);

        let nb: ClassifierArtifact = serde_json::from_value(json!({
            "kind": "multinomial_nb",
            "class_log_prior": [-0.69, -0.69],
            "feature_log_prob": [[-1.0, -2.0], [-2.0, -1.0]]
        }))
        .unwrap();
        assert_eq!(nb.build().unwrap().kind(), "multinomial_nb");
    }

    #[test]
    fn test_rejects_bad_artifacts() {
        let cases = [
            json!({"kind": "logistic_regression", "coef": [], "intercept": 0.0}),
            json!({"kind": "logistic_regression", "coef": [[1.0], [2.0]], "intercept": 0.0}),
            json!({"kind": "logistic_regression", "coef": [1.0], "intercept": [0.0, 1.0]}),
            json!({"kind": "logistic_regression", "coef": [1.0], "intercept": 0.0, "classes": [0, 1, 2]}),
            json!({"kind": "logistic_regression", "coef": [1.0], "intercept": 0.0, "classes": [1, 1]}),
            json!({"kind": "multinomial_nb", "class_log_prior": [-0.7], "feature_log_prob": [[-1.0], [-1.0]]}),
            json!({"kind": "multinomial_nb", "class_log_prior": [-0.7, -0.7], "feature_log_prob": [[-1.0]]}),
            json!({"kind": "multinomial_nb", "class_log_prior": [-0.7, -0.7], "feature_log_prob": [[-1.0], [-1.0, -2.0]]}),
        ];
        for case in cases {
            let artifact: ClassifierArtifact = serde_json::from_value(case.clone()).unwrap();
            assert!(
                matches!(artifact.build(), Err(ModelError::Invalid(_))),
                "should reject {case}"
            );
        }
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let result: Result<ClassifierArtifact, _> =
            serde_json::from_value(json!({"kind": "random_forest"}));
        assert!(result.is_err());
    }
}
