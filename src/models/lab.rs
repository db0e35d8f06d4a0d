use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{Direction, ResultStatus, Severity};
use crate::knowledge::RemedyEntry;

/// Closed numeric interval `[min, max]` considered normal for a test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `value < min` is Low, `value > max` is High, anything else Normal.
    pub fn classify(&self, value: f64) -> ResultStatus {
        if value < self.min {
            ResultStatus::Low
        } else if value > self.max {
            ResultStatus::High
        } else {
            ResultStatus::Normal
        }
    }

    /// Relative distance from the boundary that was crossed.
    /// Zero when the boundary is not positive (no meaningful ratio).
    pub fn relative_deviation(&self, value: f64, direction: Direction) -> f64 {
        let (boundary, distance) = match direction {
            Direction::Low => (self.min, self.min - value),
            Direction::High => (self.max, value - self.max),
        };
        if boundary <= 0.0 {
            return 0.0;
        }
        distance / boundary
    }

    /// `12.0-16.0`, with whole numbers keeping one decimal place.
    pub fn display(&self) -> String {
        format!("{}-{}", format_bound(self.min), format_bound(self.max))
    }
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// One test row recovered from report text.
///
/// `status` and `reference_range` are only set when the parser read them
/// straight off the report (a status word, or a range column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResult {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub status: Option<ResultStatus>,
    pub reference_range: Option<NumericRange>,
    pub raw_line: String,
}

/// An abnormal result paired with its remedy entry, if one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub normal_range: String,
    pub status: Direction,
    pub severity: Severity,
    pub remedy_info: Option<RemedyEntry>,
}

/// Finding as shown to the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingResponse {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub normal_range: String,
    pub status: Direction,
    pub severity: Severity,
    pub problem: String,
    pub meaning: String,
    pub remedies: Vec<String>,
    pub doctor_note: String,
}

/// Top-level output of a report analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_tests: usize,
    pub abnormal_findings: usize,
    pub findings: Vec<FindingResponse>,
    /// Set only when nothing abnormal was found.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    /// Set only when the report could not be parsed at all.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// OCR output, when the report arrived as an image.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extracted_text: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl AnalysisReport {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A [0, 1] score as a percentage with two decimals (`0.61234` -> `61.23`).
pub fn as_percent(fraction: f64) -> f64 {
    (fraction * 10_000.0).round() / 100.0
}
