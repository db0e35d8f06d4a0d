use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::{confidence_percent, ImageClassifier, PredictionError};

pub const NORMAL_LABEL: &str = "Normal";
pub const PNEUMONIA_LABEL: &str = "Person acquired Pneumonia";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PneumoniaPrediction {
    pub prediction: String,
    pub is_normal: bool,
    pub confidence: f64,
    pub timestamp: NaiveDateTime,
}

/// Chest X-ray screening. Class 0 is normal, any other class is pneumonia.
pub fn classify_pneumonia(
    classifier: &dyn ImageClassifier,
    image_bytes: &[u8],
) -> Result<PneumoniaPrediction, PredictionError> {
    let probabilities = classifier.classify(image_bytes)?;
    let class = argmax(&probabilities)
        .ok_or_else(|| PredictionError::Engine("model returned no probabilities".into()))?;
    let confidence = confidence_percent(&probabilities)?;
    tracing::debug!(class, confidence, "Pneumonia classifier evaluated");

    let is_normal = class == 0;
    Ok(PneumoniaPrediction {
        prediction: if is_normal { NORMAL_LABEL } else { PNEUMONIA_LABEL }.to_string(),
        is_normal,
        confidence,
        timestamp: Local::now().naive_local(),
    })
}

/// Index of the largest value; the first one wins ties. NaN never wins.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((idx, value));
        }
    }
    best.map(|(idx, _)| idx)
}
