use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FeatureScaler, PredictionError};

/// Standardisation `(x - mean) / scale`, with parameters exported from the
/// training run. A zero scale (constant training column) divides by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, PredictionError> {
        if mean.len() != scale.len() {
            return Err(PredictionError::FeatureCount {
                expected: mean.len(),
                actual: scale.len(),
            });
        }
        Ok(Self { mean, scale })
    }

    /// Parse `{"mean": [...], "scale": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, PredictionError> {
        let raw: Self = serde_json::from_str(json)?;
        Self::new(raw.mean, raw.scale)
    }

    pub fn load(path: &Path) -> Result<Self, PredictionError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| PredictionError::Load(path.to_path_buf(), e))?;
        let scaler = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), features = scaler.mean.len(), "Loaded scaler");
        Ok(scaler)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.n_features() {
            return Err(PredictionError::FeatureCount {
                expected: self.n_features(),
                actual: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn transform_standardises() {
        let scaler = StandardScaler::new(vec![50.0, 200.0], vec![10.0, 40.0]).unwrap();
        assert_eq!(scaler.transform(&[60.0, 180.0]).unwrap(), vec![1.0, -0.5]);
    }

    #[test]
    fn zero_scale_only_centres() {
        let scaler = StandardScaler::new(vec![1.0], vec![0.0]).unwrap();
        assert_eq!(scaler.transform(&[3.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn wrong_width_rejected() {
        let scaler = StandardScaler::new(vec![0.0; 4], vec![1.0; 4]).unwrap();
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::FeatureCount {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn mismatched_parameters_rejected() {
        assert!(StandardScaler::from_json(r#"{"mean": [1, 2], "scale": [1]}"#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mean": [14.0, 19.0], "scale": [3.0, 4.0]}}"#).unwrap();
        let scaler = StandardScaler::load(file.path()).unwrap();
        assert_eq!(scaler.n_features(), 2);
    }
}
