use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Arogyam";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the traditional-remedy chatbot dataset.
pub const REMEDY_DATASET_FILE: &str = "desi_remedies_dataset.json";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "arogyam=info"
}

/// Get the application data directory.
/// ~/Arogyam/ when a home directory exists, the working directory otherwise.
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

/// Default location of the remedy chatbot dataset.
pub fn remedy_dataset_path() -> PathBuf {
    app_data_dir().join(REMEDY_DATASET_FILE)
}

/// Relative-deviation cut-offs for severity tiers.
///
/// A deviation strictly above `critical` is Critical, strictly above
/// `moderate` is Moderate, anything else is Mild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityThresholds {
    pub moderate: f64,
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.15,
            critical: 0.30,
        }
    }
}

/// Lab analysis settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerConfig {
    pub severity: SeverityThresholds,
}

/// OCR fallback pipeline settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Images with either side below this are upscaled before thresholding.
    pub min_dimension: u32,
    /// Adaptive-threshold output shorter than this (trimmed chars) triggers the Otsu pass.
    pub short_text_threshold: usize,
    /// Adaptive threshold neighbourhood (odd, pixels).
    pub adaptive_block: u32,
    /// Constant subtracted from the local Gaussian mean.
    pub adaptive_offset: f32,
    /// Denoise spatial window radius.
    pub denoise_radius: u32,
    /// Denoise range sigma. Smaller keeps edges sharper.
    pub denoise_sigma: f32,
    /// Run post-OCR lab term correction on the extracted text.
    pub correct_terms: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_dimension: 300,
            short_text_threshold: 50,
            adaptive_block: 11,
            adaptive_offset: 2.0,
            denoise_radius: 2,
            denoise_sigma: 10.0,
            correct_terms: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remedy_dataset_under_app_data() {
        let path = remedy_dataset_path();
        assert!(path.starts_with(app_data_dir()));
        assert!(path.ends_with(REMEDY_DATASET_FILE));
    }

    #[test]
    fn app_name_is_arogyam() {
        assert_eq!(APP_NAME, "Arogyam");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn severity_thresholds_ordered() {
        let t = SeverityThresholds::default();
        assert!(t.moderate < t.critical);
    }

    #[test]
    fn ocr_block_is_odd() {
        assert_eq!(OcrConfig::default().adaptive_block % 2, 1);
    }
}
