use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    pub confidence: f32,
    pub word_confidences: Vec<(String, f32)>,
}

/// OCR engine abstraction (allows mocking for tests).
/// Input is a PNG-encoded, already binarised page.
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}

/// Which binarisation produced the kept text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPass {
    Adaptive,
    Otsu,
}

/// Both binarised renderings of one page, PNG-encoded.
#[derive(Debug, Clone)]
pub struct OcrInputs {
    pub adaptive_png: Vec<u8>,
    pub otsu_png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Text recovered from a report image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrText {
    pub text: String,
    pub confidence: f32,
    pub pass: ThresholdPass,
    /// Words rewritten by lab-term correction.
    pub corrections: usize,
}
