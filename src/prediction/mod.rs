//! Contracts for the risk-prediction models that sit beside the lab
//! analyzer: three tabular classifiers (heart disease, breast cancer, PCOD)
//! and a chest X-ray pneumonia classifier.
//!
//! No model runtime ships with the crate. Callers plug trained models in
//! through `Classifier` / `ImageClassifier`; this module owns feature
//! assembly, scaling, label mapping and confidence reporting.

pub mod pneumonia;
pub mod scaler;
pub mod service;
pub mod tabular;

pub use pneumonia::{classify_pneumonia, PneumoniaPrediction};
pub use scaler::StandardScaler;
pub use service::PredictionService;
pub use tabular::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::as_percent;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("{0} model not loaded")]
    ModelUnavailable(&'static str),

    #[error("Exactly {expected} features required, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Model returned unknown class {0}")]
    UnknownClass(usize),

    #[error("Model engine error: {0}")]
    Engine(String),

    #[error("Failed to read {0}: {1}")]
    Load(PathBuf, std::io::Error),

    #[error("Failed to parse scaler: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PredictionError {
    /// Whether the failure is on the server side (missing or broken model)
    /// rather than in the caller's input.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_) | Self::Engine(_))
    }
}

/// A trained tabular classifier.
pub trait Classifier {
    /// Predicted class index for one scaled feature row.
    fn predict(&self, features: &[f64]) -> Result<usize, PredictionError>;

    /// Class probabilities for one scaled feature row.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// Feature preprocessing fitted alongside a classifier.
pub trait FeatureScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// An image model. Decoding and resizing are the implementation's concern.
pub trait ImageClassifier {
    fn classify(&self, image_bytes: &[u8]) -> Result<Vec<f64>, PredictionError>;
}

/// Highest class probability as a two-decimal percentage.
pub fn confidence_percent(probabilities: &[f64]) -> Result<f64, PredictionError> {
    probabilities
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .reduce(f64::max)
        .map(as_percent)
        .ok_or_else(|| PredictionError::Engine("model returned no probabilities".into()))
}
