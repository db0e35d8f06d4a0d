//! OCR fallback for photographed or scanned lab reports.
//!
//! Image bytes are cleaned up for OCR (orientation, grayscale, upscale,
//! denoise, two binarisations), run through a pluggable `OcrEngine`, and the
//! best text is lightly corrected for common lab-term misreads. No OCR
//! engine ships with the crate.

pub mod medical_correction;
pub mod ocr;
pub mod preprocess;
pub mod types;

pub use medical_correction::correct_lab_terms;
pub use ocr::extract_report_text;
pub use preprocess::prepare_for_ocr;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("No text could be extracted from the image")]
    NoTextExtracted,
}
