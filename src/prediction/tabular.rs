use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{confidence_percent, Classifier, FeatureScaler, PredictionError};

pub const HEART_RISK_LEVELS: [&str; 3] = ["Low Risk", "Medium Risk", "High Risk"];
pub const PCOD_RISK_LEVELS: [&str; 3] = [
    "Low Risk of PCOD",
    "Medium Risk of PCOD",
    "High Risk of PCOD",
];
pub const BREAST_FEATURE_COUNT: usize = 10;

/// A classifier with the scaler it was trained behind.
pub struct TabularModel {
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn FeatureScaler>,
}

impl TabularModel {
    pub fn new(classifier: Box<dyn Classifier>, scaler: Box<dyn FeatureScaler>) -> Self {
        Self { classifier, scaler }
    }

    /// Scale, predict, and report `(class, confidence %)`.
    pub fn evaluate(&self, features: &[f64]) -> Result<(usize, f64), PredictionError> {
        let scaled = self.scaler.transform(features)?;
        let class = self.classifier.predict(&scaled)?;
        let probabilities = self.classifier.predict_proba(&scaled)?;
        let confidence = confidence_percent(&probabilities)?;
        debug!(class, confidence, "Tabular model evaluated");
        Ok((class, confidence))
    }
}

/// Heart-disease questionnaire. Missing numbers default to zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartInput {
    pub age: f64,
    pub gender: String,
    pub blood_pressure: f64,
    pub cholesterol: f64,
    pub diabetes: String,
}

impl HeartInput {
    /// `[age, gender (male = 1), bp, cholesterol, diabetes (yes = 1)]`
    pub fn features(&self) -> [f64; 5] {
        let gender = flag(self.gender.trim().eq_ignore_ascii_case("male"));
        let diabetes = flag(self.diabetes.trim().eq_ignore_ascii_case("yes"));
        [
            self.age,
            gender,
            self.blood_pressure,
            self.cholesterol,
            diabetes,
        ]
    }
}

/// Ten tumour measurements in training column order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BreastCancerInput {
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodFlow {
    Light,
    #[default]
    Normal,
    Heavy,
}

impl PeriodFlow {
    /// Free-text flow description; anything unrecognised counts as normal.
    pub fn parse_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "light" => Self::Light,
            "heavy" => Self::Heavy,
            _ => Self::Normal,
        }
    }

    pub fn code(&self) -> f64 {
        match self {
            Self::Light => 0.0,
            Self::Normal => 1.0,
            Self::Heavy => 2.0,
        }
    }
}

/// PCOD questionnaire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PcodInput {
    pub age: f64,
    pub period_flow: String,
    pub bmi: f64,
    pub cycle_length: f64,
}

impl PcodInput {
    /// `[age, bmi, cycle_length, period_flow (light 0, normal 1, heavy 2)]`
    pub fn features(&self) -> [f64; 4] {
        [
            self.age,
            self.bmi,
            self.cycle_length,
            PeriodFlow::parse_loose(&self.period_flow).code(),
        ]
    }
}

/// A tiered risk prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPrediction {
    pub prediction: String,
    pub risk_score: usize,
    pub confidence: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreastCancerPrediction {
    pub prediction: usize,
    pub is_malignant: bool,
    pub confidence: f64,
    pub timestamp: NaiveDateTime,
}

pub fn predict_heart(model: &TabularModel, input: &HeartInput) -> Result<RiskPrediction, PredictionError> {
    tiered(model, &input.features(), &HEART_RISK_LEVELS)
}

pub fn predict_pcod(model: &TabularModel, input: &PcodInput) -> Result<RiskPrediction, PredictionError> {
    tiered(model, &input.features(), &PCOD_RISK_LEVELS)
}

pub fn predict_breast_cancer(
    model: &TabularModel,
    input: &BreastCancerInput,
) -> Result<BreastCancerPrediction, PredictionError> {
    if input.features.len() != BREAST_FEATURE_COUNT {
        return Err(PredictionError::FeatureCount {
            expected: BREAST_FEATURE_COUNT,
            actual: input.features.len(),
        });
    }
    let (class, confidence) = model.evaluate(&input.features)?;
    Ok(BreastCancerPrediction {
        prediction: class,
        is_malignant: class == 1,
        confidence,
        timestamp: Local::now().naive_local(),
    })
}

fn tiered(
    model: &TabularModel,
    features: &[f64],
    tiers: &[&str],
) -> Result<RiskPrediction, PredictionError> {
    let (class, confidence) = model.evaluate(features)?;
    let label = tiers
        .get(class)
        .ok_or(PredictionError::UnknownClass(class))?;
    Ok(RiskPrediction {
        prediction: (*label).to_string(),
        risk_score: class,
        confidence,
        timestamp: Local::now().naive_local(),
    })
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}
