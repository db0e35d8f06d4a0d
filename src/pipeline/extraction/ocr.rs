use tracing::{debug, info};

use super::medical_correction::correct_lab_terms;
use super::preprocess::prepare_for_ocr;
use super::types::{OcrEngine, OcrPageResult, OcrText, ThresholdPass};
use super::ExtractionError;
use crate::config::OcrConfig;

fn trimmed_len(result: &OcrPageResult) -> usize {
    result.text.trim().chars().count()
}

/// OCR a report image.
///
/// The adaptive-threshold page is read first. When it yields fewer than
/// `short_text_threshold` characters the Otsu page is read as well and the
/// longer text wins.
pub fn extract_report_text(
    engine: &dyn OcrEngine,
    image_bytes: &[u8],
    config: &OcrConfig,
) -> Result<OcrText, ExtractionError> {
    let inputs = prepare_for_ocr(image_bytes, config)?;

    let adaptive = engine.ocr_image(&inputs.adaptive_png)?;
    let mut best = (ThresholdPass::Adaptive, adaptive);

    if trimmed_len(&best.1) < config.short_text_threshold {
        debug!(
            chars = trimmed_len(&best.1),
            threshold = config.short_text_threshold,
            "Adaptive pass short, trying Otsu"
        );
        let otsu = engine.ocr_image(&inputs.otsu_png)?;
        if trimmed_len(&otsu) > trimmed_len(&best.1) {
            best = (ThresholdPass::Otsu, otsu);
        }
    }

    let (pass, result) = best;
    let text = result.text.trim();
    if text.is_empty() {
        return Err(ExtractionError::NoTextExtracted);
    }

    let (text, corrections) = if config.correct_terms {
        correct_lab_terms(text)
    } else {
        (text.to_string(), 0)
    };

    info!(
        pass = ?pass,
        chars = text.chars().count(),
        confidence = result.confidence,
        corrections,
        "Report text extracted"
    );

    Ok(OcrText {
        text,
        confidence: result.confidence,
        pass,
        corrections,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

    use super::*;

    /// Returns scripted texts in call order and records every call.
    struct MockOcrEngine {
        texts: Vec<&'static str>,
        calls: RefCell<usize>,
    }

    impl MockOcrEngine {
        fn new(texts: Vec<&'static str>) -> Self {
            Self {
                texts,
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl OcrEngine for MockOcrEngine {
        fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
            assert!(image::load_from_memory(image_bytes).is_ok());
            let mut calls = self.calls.borrow_mut();
            let text = self.texts.get(*calls).copied().unwrap_or_default();
            *calls += 1;
            Ok(OcrPageResult {
                text: text.to_string(),
                confidence: 0.8,
                word_confidences: vec![],
            })
        }
    }

    struct FailingOcrEngine;

    impl OcrEngine for FailingOcrEngine {
        fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
            Err(ExtractionError::OcrProcessing("engine crashed".into()))
        }
    }

    fn make_test_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([250, 250, 250]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    const LONG_TEXT: &str = "Hemoglobin: 8.5 g/dL (Low)\nVitamin D: 15 ng/mL (Low)\nCalcium: 9 mg/dL";

    #[test]
    fn long_adaptive_text_skips_otsu() {
        let engine = MockOcrEngine::new(vec![LONG_TEXT, "unused"]);
        let out = extract_report_text(&engine, &make_test_image(320, 320), &OcrConfig::default())
            .unwrap();
        assert_eq!(engine.calls(), 1);
        assert_eq!(out.pass, ThresholdPass::Adaptive);
        assert_eq!(out.text, LONG_TEXT);
    }

    #[test]
    fn short_adaptive_text_falls_back_to_longer_otsu() {
        let engine = MockOcrEngine::new(vec!["Hb 8", LONG_TEXT]);
        let out = extract_report_text(&engine, &make_test_image(320, 320), &OcrConfig::default())
            .unwrap();
        assert_eq!(engine.calls(), 2);
        assert_eq!(out.pass, ThresholdPass::Otsu);
    }

    #[test]
    fn short_adaptive_kept_when_otsu_is_shorter() {
        let engine = MockOcrEngine::new(vec!["Hemoglobin: 8.5", "Hb"]);
        let out = extract_report_text(&engine, &make_test_image(320, 320), &OcrConfig::default())
            .unwrap();
        assert_eq!(out.pass, ThresholdPass::Adaptive);
        assert_eq!(out.text, "Hemoglobin: 8.5");
    }

    #[test]
    fn blank_text_is_an_error() {
        let engine = MockOcrEngine::new(vec!["  \n ", ""]);
        let err = extract_report_text(&engine, &make_test_image(320, 320), &OcrConfig::default())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoTextExtracted));
    }

    #[test]
    fn terms_are_corrected_unless_disabled() {
        let engine = MockOcrEngine::new(vec!["Vitamln D: 15 ng/mL"; 2]);
        let out = extract_report_text(&engine, &make_test_image(320, 320), &OcrConfig::default())
            .unwrap();
        assert_eq!(out.text, "Vitamin D: 15 ng/mL");
        assert_eq!(out.corrections, 1);

        let engine = MockOcrEngine::new(vec!["Vitamln D: 15 ng/mL"; 2]);
        let config = OcrConfig {
            correct_terms: false,
            ..OcrConfig::default()
        };
        let out = extract_report_text(&engine, &make_test_image(320, 320), &config).unwrap();
        assert_eq!(out.text, "Vitamln D: 15 ng/mL");
    }

    #[test]
    fn engine_failure_propagates() {
        let err = extract_report_text(&FailingOcrEngine, &make_test_image(320, 320), &OcrConfig::default())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::OcrProcessing(_)));
    }

    #[test]
    fn invalid_image_rejected_before_ocr() {
        let engine = MockOcrEngine::new(vec![LONG_TEXT]);
        assert!(extract_report_text(&engine, &[1, 2, 3], &OcrConfig::default()).is_err());
        assert_eq!(engine.calls(), 0);
    }
}
