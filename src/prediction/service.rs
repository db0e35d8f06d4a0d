use super::pneumonia::{classify_pneumonia, PneumoniaPrediction};
use super::tabular::{
    predict_breast_cancer, predict_heart, predict_pcod, BreastCancerInput,
    BreastCancerPrediction, HeartInput, PcodInput, RiskPrediction, TabularModel,
};
use super::{ImageClassifier, PredictionError};

/// Log a failed prediction at a level matching who has to act on it:
/// `warn` for a missing or broken model, `debug` for bad caller input.
fn logged<T>(
    model: &'static str,
    result: Result<T, PredictionError>,
) -> Result<T, PredictionError> {
    if let Err(e) = &result {
        if e.is_unavailable() {
            tracing::warn!(model, error = %e, "Prediction model unavailable");
        } else {
            tracing::debug!(model, error = %e, "Prediction input rejected");
        }
    }
    result
}

/// The set of risk models a deployment has loaded. Any of them may be
/// absent; asking an absent model is `ModelUnavailable`.
#[derive(Default)]
pub struct PredictionService {
    heart: Option<TabularModel>,
    breast_cancer: Option<TabularModel>,
    pcod: Option<TabularModel>,
    pneumonia: Option<Box<dyn ImageClassifier>>,
}

impl PredictionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heart(mut self, model: TabularModel) -> Self {
        self.heart = Some(model);
        self
    }

    pub fn with_breast_cancer(mut self, model: TabularModel) -> Self {
        self.breast_cancer = Some(model);
        self
    }

    pub fn with_pcod(mut self, model: TabularModel) -> Self {
        self.pcod = Some(model);
        self
    }

    pub fn with_pneumonia(mut self, classifier: Box<dyn ImageClassifier>) -> Self {
        self.pneumonia = Some(classifier);
        self
    }

    pub fn heart(&self, input: &HeartInput) -> Result<RiskPrediction, PredictionError> {
        let result = match self.heart.as_ref() {
            Some(model) => predict_heart(model, input),
            None => Err(PredictionError::ModelUnavailable("Heart Disease")),
        };
        logged("Heart Disease", result)
    }

    pub fn breast_cancer(
        &self,
        input: &BreastCancerInput,
    ) -> Result<BreastCancerPrediction, PredictionError> {
        let result = match self.breast_cancer.as_ref() {
            Some(model) => predict_breast_cancer(model, input),
            None => Err(PredictionError::ModelUnavailable("Breast Cancer")),
        };
        logged("Breast Cancer", result)
    }

    pub fn pcod(&self, input: &PcodInput) -> Result<RiskPrediction, PredictionError> {
        let result = match self.pcod.as_ref() {
            Some(model) => predict_pcod(model, input),
            None => Err(PredictionError::ModelUnavailable("PCOD")),
        };
        logged("PCOD", result)
    }

    pub fn pneumonia(&self, image_bytes: &[u8]) -> Result<PneumoniaPrediction, PredictionError> {
        let result = match self.pneumonia.as_deref() {
            Some(classifier) => classify_pneumonia(classifier, image_bytes),
            None => Err(PredictionError::ModelUnavailable("Pneumonia")),
        };
        logged("Pneumonia", result)
    }
}
