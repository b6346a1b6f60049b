//! Text Vectorizer - TF-IDF / term counts
//!
//! Mirrors the fitted vectorizer exported by the training pipeline:
//! token pattern → n-grams → vocabulary lookup → (idf) → row normalization.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{FeatureVector, ModelError, Vectorizer};

const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerKind {
    Tfidf,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Norm {
    L1,
    L2,
}

/// Serialized vectorizer as exported by the training pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct VectorizerArtifact {
    pub kind: VectorizerKind,

    /// Term → column index
    pub vocabulary: HashMap<String, usize>,

    /// IDF weight per column (tfidf only)
    #[serde(default)]
    pub idf: Option<Vec<f64>>,

    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    #[serde(default = "default_true")]
    pub lowercase: bool,

    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,

    /// Missing → kind default (l2 for tfidf, none for count); `null` → none
    #[serde(default, deserialize_with = "deserialize_some")]
    pub norm: Option<Option<Norm>>,

    #[serde(default)]
    pub sublinear_tf: bool,

    #[serde(default)]
    pub binary: bool,

    #[serde(default)]
    pub stop_words: Vec<String>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// VECTORIZER
// ============================================================================

#[derive(Debug, Clone)]
pub struct TextVectorizer {
    kind: VectorizerKind,
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    ngram_range: (usize, usize),
    lowercase: bool,
    token_pattern: Regex,
    norm: Option<Norm>,
    sublinear_tf: bool,
    binary: bool,
    stop_words: HashSet<String>,
}

impl TextVectorizer {
    /// Validate an artifact and build the vectorizer.
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self, ModelError> {
        let n_features = artifact.vocabulary.len();
        if n_features == 0 {
            return Err(ModelError::Invalid("vectorizer vocabulary is empty".to_string()));
        }

        let mut seen = vec![false; n_features];
        for (term, &col) in &artifact.vocabulary {
            match seen.get_mut(col) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(ModelError::Invalid(format!(
                        "vocabulary column {col} assigned twice (term {term:?})"
                    )))
                }
                None => {
                    return Err(ModelError::Invalid(format!(
                        "vocabulary column {col} for term {term:?} out of range 0..{n_features}"
                    )))
                }
            }
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::Invalid(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }

        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|e| {
            ModelError::Invalid(format!("invalid token_pattern {:?}: {e}", artifact.token_pattern))
        })?;
        if token_pattern.captures_len() > 2 {
            return Err(ModelError::Invalid(
                "token_pattern may contain at most one capture group".to_string(),
            ));
        }

        let idf = match artifact.kind {
            VectorizerKind::Tfidf => {
                let idf = artifact.idf.ok_or_else(|| {
                    ModelError::Invalid("tfidf vectorizer is missing idf weights".to_string())
                })?;
                if idf.len() != n_features {
                    return Err(ModelError::Invalid(format!(
                        "idf has {} weights but vocabulary has {n_features} terms",
                        idf.len()
                    )));
                }
                Some(idf)
            }
            VectorizerKind::Count => None,
        };

        let norm = artifact.norm.unwrap_or(match artifact.kind {
            VectorizerKind::Tfidf => Some(Norm::L2),
            VectorizerKind::Count => None,
        });

        Ok(Self {
            kind: artifact.kind,
            vocabulary: artifact.vocabulary,
            idf,
            ngram_range: artifact.ngram_range,
            lowercase: artifact.lowercase,
            token_pattern,
            norm,
            sublinear_tf: artifact.sublinear_tf,
            binary: artifact.binary,
            stop_words: artifact.stop_words.into_iter().collect(),
        })
    }

    /// Tokens matched by the token pattern (first capture group if present)
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if self.token_pattern.captures_len() == 2 {
            self.token_pattern
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
                .collect()
        } else {
            self.token_pattern.find_iter(text).map(|m| m.as_str()).collect()
        }
    }

    /// Word n-grams in the configured range, joined by single spaces
    fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<&str> = self
            .tokenize(&text)
            .into_iter()
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    fn normalize(&self, entries: &mut [(usize, f64)]) {
        let norm = match self.norm {
            Some(Norm::L2) => entries.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|&(_, v)| v.abs()).sum::<f64>(),
            None => return,
        };
        if norm > 0.0 {
            for (_, v) in entries.iter_mut() {
                *v /= norm;
            }
        }
    }
}

impl Vectorizer for TextVectorizer {
    fn kind(&self) -> &'static str {
        match self.kind {
            VectorizerKind::Tfidf => "tfidf",
            VectorizerKind::Count => "count",
        }
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    fn transform(&self, text: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&col) = self.vocabulary.get(&term) {
                *counts.entry(col).or_default() += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, tf)| {
                let tf = if self.binary {
                    1.0
                } else if self.sublinear_tf {
                    1.0 + tf.ln()
                } else {
                    tf
                };
                let weight = self.idf.as_ref().map_or(1.0, |idf| idf[col]);
                (col, tf * weight)
            })
            .collect();

        self.normalize(&mut entries);
        debug!(nnz = entries.len(), kind = self.kind(), "Vectorized text");

        FeatureVector::new(self.n_features(), entries)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tfidf_artifact() -> VectorizerArtifact {
        serde_json::from_value(json!({
            "kind": "tfidf",
            "vocabulary": {"hate": 0, "love": 1, "people": 2},
            "idf": [2.0, 1.0, 1.5]
        }))
        .expect("valid artifact")
    }

    #[test]
    fn test_defaults() {
        let artifact = tfidf_artifact();
        assert_eq!(artifact.ngram_range, (1, 1));
        assert!(artifact.lowercase);
        assert_eq!(artifact.token_pattern, DEFAULT_TOKEN_PATTERN);
        assert_eq!(artifact.norm, None);

        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        assert_eq!(vectorizer.norm, Some(Norm::L2));
        assert_eq!(vectorizer.n_features(), 3);
        assert_eq!(vectorizer.kind(), "tfidf");
    }

    #[test]
    fn test_explicit_null_norm() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "tfidf",
            "vocabulary": {"a1": 0},
            "idf": [1.0],
            "norm": null
        }))
        .unwrap();
        assert_eq!(artifact.norm, Some(None));
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        assert_eq!(vectorizer.norm, None);
    }

    #[test]
    fn test_tfidf_transform_l2() {
        let vectorizer = TextVectorizer::from_artifact(tfidf_artifact()).unwrap();
        let v = vectorizer.transform("hate hate people unknown");

        // raw: hate = 2 * 2.0 = 4.0, people = 1 * 1.5 = 1.5
        let norm = (4.0f64 * 4.0 + 1.5 * 1.5).sqrt();
        let dense = v.to_dense();
        assert!((dense[0] - 4.0 / norm).abs() < 1e-12);
        assert_eq!(dense[1], 0.0);
        assert!((dense[2] - 1.5 / norm).abs() < 1e-12);

        let length: f64 = dense.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((length - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_text_gives_empty_row() {
        let vectorizer = TextVectorizer::from_artifact(tfidf_artifact()).unwrap();
        let v = vectorizer.transform("");
        assert_eq!(v.nnz(), 0);
        assert_eq!(v.dim(), 3);
    }

    #[test]
    fn test_single_char_tokens_ignored_by_default_pattern() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "count",
            "vocabulary": {"a": 0, "ok": 1}
        }))
        .unwrap();
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        let v = vectorizer.transform("a ok ok");
        assert_eq!(v.to_dense(), vec![0.0, 2.0]);
    }

    #[test]
    fn test_count_binary_and_bigrams() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "count",
            "vocabulary": {"go": 0, "away": 1, "go away": 2},
            "ngram_range": [1, 2],
            "binary": true
        }))
        .unwrap();
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        let v = vectorizer.transform("go away go away");
        assert_eq!(v.to_dense(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sublinear_tf() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "tfidf",
            "vocabulary": {"spam": 0},
            "idf": [1.0],
            "norm": null,
            "sublinear_tf": true
        }))
        .unwrap();
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        let v = vectorizer.transform("spam spam spam");
        assert!((v.to_dense()[0] - (1.0 + 3.0f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_l1_norm() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "count",
            "vocabulary": {"aa": 0, "bb": 1},
            "norm": "l1"
        }))
        .unwrap();
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        let v = vectorizer.transform("aa aa aa bb");
        assert_eq!(v.to_dense(), vec![0.75, 0.25]);
    }

    #[test]
    fn test_vectorizer_stop_words() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "count",
            "vocabulary": {"bad": 0, "words": 1},
            "stop_words": ["words"]
        }))
        .unwrap();
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        assert_eq!(vectorizer.transform("bad words").to_dense(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_capture_group_pattern() {
        let artifact: VectorizerArtifact = serde_json::from_value(json!({
            "kind": "count",
            "vocabulary": {"x": 0},
            "token_pattern": r"<(\w+)>"
        }))
        .unwrap();
        let vectorizer = TextVectorizer::from_artifact(artifact).unwrap();
        assert_eq!(vectorizer.transform("<x> x <x>").to_dense(), vec![2.0]);
    }

    #[test]
    fn test_rejects_bad_artifacts() {
        let cases = [
            json!({"kind": "tfidf", "vocabulary": {}, "idf": []}),
            json!({"kind": "tfidf", "vocabulary": {"aa": 0}}),
            json!({"kind": "tfidf", "vocabulary": {"aa": 0, "bb": 1}, "idf": [1.0]}),
            json!({"kind": "count", "vocabulary": {"aa": 0, "bb": 5}}),
            json!({"kind": "count", "vocabulary": {"aa": 0, "bb": 0}}),
            json!({"kind": "count", "vocabulary": {"aa": 0}, "ngram_range": [2, 1]}),
            json!({"kind": "count", "vocabulary": {"aa": 0}, "ngram_range": [0, 1]}),
            json!({"kind": "count", "vocabulary": {"aa": 0}, "token_pattern": "(unclosed"}),
            json!({"kind": "count", "vocabulary": {"aa": 0}, "token_pattern": r"(\w)(\w)"}),
        ];
        for case in cases {
            let artifact: VectorizerArtifact = serde_json::from_value(case.clone()).unwrap();
            assert!(
                matches!(TextVectorizer::from_artifact(artifact), Err(ModelError::Invalid(_))),
                "should reject {case}"
            );
        }
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let result: Result<VectorizerArtifact, _> =
            serde_json::from_value(json!({"kind": "hashing", "vocabulary": {}}));
        assert!(result.is_err());
    }
}
