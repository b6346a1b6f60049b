//! Artifact Loader
//!
//! Reads the vectorizer and classifier documents once at startup.
//! Any failure here is fatal: the server never starts without a model.

use std::fs;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::classifier::ClassifierArtifact;
use super::vectorizer::{TextVectorizer, VectorizerArtifact};
use super::{ModelError, Predictor, Vectorizer};

/// Provenance of one artifact file
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactInfo {
    pub path: String,
    pub sha256: String,
    pub size_bytes: u64,
}

/// Summary of the loaded model, reported by `/health` and at startup
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelInfo {
    pub vectorizer_kind: String,
    pub classifier_kind: String,
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub vectorizer: ArtifactInfo,
    pub classifier: ArtifactInfo,
    pub loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn read_artifact(path: &Path) -> Result<(Vec<u8>, ArtifactInfo), ModelError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: display.clone(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let info = ArtifactInfo {
        path: display,
        sha256: hex::encode(hasher.finalize()),
        size_bytes: bytes.len() as u64,
    };
    Ok((bytes, info))
}

fn parse<T: serde::de::DeserializeOwned>(bytes: &[u8], info: &ArtifactInfo) -> Result<T, ModelError> {
    serde_json::from_slice(bytes).map_err(|source| ModelError::Parse {
        path: info.path.clone(),
        source,
    })
}

/// Load, validate and pair both artifacts.
pub fn load_predictor(
    vectorizer_path: impl AsRef<Path>,
    classifier_path: impl AsRef<Path>,
) -> Result<Predictor, ModelError> {
    let (bytes, vectorizer_info) = read_artifact(vectorizer_path.as_ref())?;
    let vectorizer = TextVectorizer::from_artifact(parse::<VectorizerArtifact>(&bytes, &vectorizer_info)?)?;
    tracing::info!(
        path = %vectorizer_info.path,
        sha256 = %vectorizer_info.sha256,
        "Vectorizer loaded"
    );

    let (bytes, classifier_info) = read_artifact(classifier_path.as_ref())?;
    let classifier = parse::<ClassifierArtifact>(&bytes, &classifier_info)?.build()?;
    tracing::info!(
        path = %classifier_info.path,
        sha256 = %classifier_info.sha256,
        "Classifier loaded"
    );

    let info = ModelInfo {
        vectorizer_kind: vectorizer.kind().to_string(),
        classifier_kind: classifier.kind().to_string(),
        n_features: vectorizer.n_features(),
        classes: classifier.classes().to_vec(),
        vectorizer: vectorizer_info,
        classifier: classifier_info,
        loaded_at: Some(chrono::Utc::now()),
    };

    Predictor::new(Box::new(vectorizer), classifier, info)
}

// ============================================================================
// TESTS
// ============================================================================
