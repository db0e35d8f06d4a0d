//! Report Orchestrator: parse, analyze every result, render the findings.

use chrono::Local;

use super::analyzer::ValueAnalyzer;
use super::extraction::{extract_report_text, ExtractionError, OcrEngine};
use super::parser::parse_report_with_strategy;
use crate::config::OcrConfig;
use crate::models::{AnalysisReport, Finding, FindingResponse, Gender, ParsedResult};

pub const PARSE_ERROR_MESSAGE: &str = "Could not parse lab report. Please ensure the report is in text format with test names and values.";
pub const ALL_NORMAL_MESSAGE: &str = "Sab values normal lag rahe hain! Aap healthy hain. 👍";
pub const FALLBACK_DOCTOR_NOTE: &str = "Please consult doctor for proper evaluation.";

/// Entry point for lab report analysis. Holds no per-call state, so one
/// instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ReportAnalyzer<'k> {
    analyzer: ValueAnalyzer<'k>,
    ocr: OcrConfig,
}

impl Default for ReportAnalyzer<'static> {
    fn default() -> Self {
        Self::new(ValueAnalyzer::default(), OcrConfig::default())
    }
}

impl<'k> ReportAnalyzer<'k> {
    pub fn new(analyzer: ValueAnalyzer<'k>, ocr: OcrConfig) -> Self {
        Self { analyzer, ocr }
    }

    /// Analyze report text. `gender` is free text (`"male"`, `"F"`, ...);
    /// anything unrecognized selects ungendered ranges.
    pub fn analyze_report(&self, text: &str, gender: Option<&str>) -> AnalysisReport {
        let (parsed, strategy) = parse_report_with_strategy(text);
        if parsed.is_empty() {
            tracing::info!(strategy = strategy.as_str(), "Lab report could not be parsed");
            return error_report(PARSE_ERROR_MESSAGE);
        }

        let gender = gender.and_then(Gender::parse_loose);
        let findings = self.collect_findings(&parsed, gender);

        tracing::info!(
            strategy = strategy.as_str(),
            total_tests = parsed.len(),
            abnormal = findings.len(),
            "Lab report analyzed"
        );

        let message = findings.is_empty().then(|| ALL_NORMAL_MESSAGE.to_string());
        AnalysisReport {
            total_tests: parsed.len(),
            abnormal_findings: findings.len(),
            findings: findings.iter().map(render_finding).collect(),
            message,
            error: None,
            extracted_text: None,
            timestamp: Local::now().naive_local(),
        }
    }

    /// OCR an uploaded report image, then analyze the recovered text.
    pub fn analyze_image(
        &self,
        engine: &dyn OcrEngine,
        image_bytes: &[u8],
        gender: Option<&str>,
    ) -> Result<AnalysisReport, ExtractionError> {
        let ocr = extract_report_text(engine, image_bytes, &self.ocr)?;
        let mut report = self.analyze_report(&ocr.text, gender);
        report.extracted_text = Some(ocr.text);
        Ok(report)
    }

    /// Abnormal findings in document order.
    ///
    /// Results read off a report table with both a status and a range use
    /// that range directly; everything else goes through the reference table.
    pub fn collect_findings(&self, parsed: &[ParsedResult], gender: Option<Gender>) -> Vec<Finding> {
        parsed
            .iter()
            .filter_map(|result| match (result.status, result.reference_range) {
                (Some(status), Some(range)) => {
                    let direction = status.direction()?;
                    Some(self.analyzer.finding_from_range(
                        &result.test_name,
                        result.value,
                        &result.unit,
                        range,
                        direction,
                    ))
                }
                _ => self
                    .analyzer
                    .analyze(&result.test_name, result.value, &result.unit, gender),
            })
            .collect()
    }
}

fn error_report(message: &str) -> AnalysisReport {
    AnalysisReport {
        total_tests: 0,
        abnormal_findings: 0,
        findings: Vec::new(),
        message: None,
        error: Some(message.to_string()),
        extracted_text: None,
        timestamp: Local::now().naive_local(),
    }
}

/// Patient-facing rendering of a finding.
pub fn render_finding(finding: &Finding) -> FindingResponse {
    let status_word = finding.status.as_str().to_lowercase();
    let short_name = finding
        .test_name
        .split('(')
        .next()
        .unwrap_or_default()
        .trim();
    let short_name = if short_name.is_empty() {
        finding.test_name.trim()
    } else {
        short_name
    };

    let (meaning, remedies, doctor_note) = match &finding.remedy_info {
        Some(entry) => (
            entry.meaning.clone(),
            entry.remedies.clone(),
            if entry.doctor_note.trim().is_empty() {
                FALLBACK_DOCTOR_NOTE.to_string()
            } else {
                entry.doctor_note.clone()
            },
        ),
        None => (
            format!("Yeh value normal se {status_word} hai."),
            Vec::new(),
            FALLBACK_DOCTOR_NOTE.to_string(),
        ),
    };

    FindingResponse {
        test_name: finding.test_name.clone(),
        value: finding.value,
        unit: finding.unit.clone(),
        normal_range: finding.normal_range.clone(),
        status: finding.status,
        severity: finding.severity,
        problem: format!("{short_name} {status_word} hai."),
        meaning,
        remedies,
        doctor_note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::RemedyEntry;
    use crate::models::{Direction, Severity};
    use crate::pipeline::extraction::OcrPageResult;

    fn analyzer() -> ReportAnalyzer<'static> {
        ReportAnalyzer::default()
    }

    fn make_finding(name: &str, remedy: Option<RemedyEntry>) -> Finding {
        Finding {
            test_name: name.into(),
            value: 8.5,
            unit: "g/dL".into(),
            normal_range: "12.0-16.0 g/dL".into(),
            status: Direction::Low,
            severity: Severity::Moderate,
            remedy_info: remedy,
        }
    }

    struct MockOcrEngine {
        text: String,
    }

    impl OcrEngine for MockOcrEngine {
        fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
            Ok(OcrPageResult {
                text: self.text.clone(),
                confidence: 0.9,
                word_confidences: vec![],
            })
        }
    }

    fn make_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::GrayImage::from_pixel(width, height, image::Luma([255u8]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn empty_report_is_error_shaped() {
        let report = analyzer().analyze_report("", None);
        assert!(report.is_error());
        assert_eq!(report.error.as_deref(), Some(PARSE_ERROR_MESSAGE));
        assert!(report.findings.is_empty());
        assert_eq!(report.total_tests, 0);
        assert!(report.message.is_none());
    }

    #[test]
    fn all_normal_report_has_positive_message() {
        let report = analyzer().analyze_report("Hemoglobin: 14 g/dL\nCalcium: 9.2 mg/dL", None);
        assert!(!report.is_error());
        assert_eq!(report.total_tests, 2);
        assert_eq!(report.abnormal_findings, 0);
        assert_eq!(report.message.as_deref(), Some(ALL_NORMAL_MESSAGE));
    }

    #[test]
    fn line_report_with_remedies() {
        let text = "Hemoglobin: 8.5 g/dL (Low)\nVitamin D: 15 ng/mL (Low)\nTSH: 2.1 mIU/L";
        let report = analyzer().analyze_report(text, Some("female"));
        assert_eq!(report.total_tests, 3);
        assert_eq!(report.abnormal_findings, 2);
        assert!(report.message.is_none());

        let hb = &report.findings[0];
        assert_eq!(hb.problem, "Hemoglobin low hai.");
        assert_eq!(hb.normal_range, "12.0-15.5 g/dL");
        assert_eq!(hb.severity, Severity::Moderate);
        assert_eq!(hb.remedies.len(), 5);
        assert_eq!(report.findings[1].test_name, "Vitamin D");
    }

    #[test]
    fn table_report_uses_table_range() {
        let text = "HAEMOGLOBIN (Hb)\nResult\n10.2\nUnit\ngm/dl\nRange\n11-15";
        let report = analyzer().analyze_report(text, None);
        assert_eq!(report.abnormal_findings, 1);
        let finding = &report.findings[0];
        assert_eq!(finding.normal_range, "11.0-15.0 gm/dl");
        assert_eq!(finding.severity, Severity::Mild);
        assert_eq!(finding.problem, "HAEMOGLOBIN low hai.");
        assert!(finding.meaning.contains("lahu"));
    }

    #[test]
    fn table_row_in_range_is_skipped() {
        let text = "HAEMOGLOBIN\nResult\n13\nUnit\ngm/dl\nRange\n12-15";
        let report = analyzer().analyze_report(text, None);
        assert_eq!(report.total_tests, 1);
        assert_eq!(report.abnormal_findings, 0);
        assert!(report.message.is_some());
    }

    #[test]
    fn unrecognized_tests_count_but_do_not_report() {
        let report = analyzer().analyze_report("Serum Sodium: 120 mEq/L", None);
        assert_eq!(report.total_tests, 1);
        assert_eq!(report.abnormal_findings, 0);
        assert!(!report.is_error());
    }

    #[test]
    fn gender_changes_outcome() {
        let male = analyzer().analyze_report("Hemoglobin: 13.0 g/dL", Some("male"));
        let female = analyzer().analyze_report("Hemoglobin: 13.0 g/dL", Some("female"));
        let unknown = analyzer().analyze_report("Hemoglobin: 13.0 g/dL", Some("other"));
        assert_eq!(male.abnormal_findings, 1);
        assert_eq!(female.abnormal_findings, 0);
        assert_eq!(unknown.abnormal_findings, 0);
    }

    #[test]
    fn render_without_remedy_uses_fallbacks() {
        let response = render_finding(&make_finding("Creatinine", None));
        assert_eq!(response.problem, "Creatinine low hai.");
        assert_eq!(response.meaning, "Yeh value normal se low hai.");
        assert!(response.remedies.is_empty());
        assert_eq!(response.doctor_note, FALLBACK_DOCTOR_NOTE);
    }

    #[test]
    fn render_empty_note_falls_back() {
        let entry = RemedyEntry {
            test_key: "iron".into(),
            direction: Direction::Low,
            meaning: "m".into(),
            remedies: vec!["r".into()],
            doctor_note: "  ".into(),
        };
        let response = render_finding(&make_finding("Serum Iron (Fe)", Some(entry)));
        assert_eq!(response.problem, "Serum Iron low hai.");
        assert_eq!(response.meaning, "m");
        assert_eq!(response.doctor_note, FALLBACK_DOCTOR_NOTE);
    }

    #[test]
    fn image_path_attaches_extracted_text() {
        let engine = MockOcrEngine {
            text: "Hemoglobin: 8.5 g/dL (Low)\nCalcium: 7.0 mg/dL (Low)\nSample collected at lab".into(),
        };
        let report = analyzer()
            .analyze_image(&engine, &make_png(400, 400), None)
            .unwrap();
        assert_eq!(report.abnormal_findings, 2);
        assert!(report.extracted_text.unwrap().contains("Hemoglobin"));
    }

    #[test]
    fn image_path_propagates_extraction_errors() {
        let engine = MockOcrEngine { text: "   ".into() };
        let err = analyzer()
            .analyze_image(&engine, &make_png(400, 400), None)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoTextExtracted));
    }

    #[test]
    fn report_serializes_findings() {
        let report = analyzer().analyze_report("Hemoglobin: 7 g/dL", None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["findings"][0]["status"], "Low");
        assert_eq!(json["findings"][0]["severity"], "critical");
        assert!(json.get("message").is_none());
        assert!(json["timestamp"].is_string());
    }
}
