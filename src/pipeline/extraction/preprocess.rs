//! Image clean-up ahead of OCR.
//!
//! Phone photos of printed reports arrive rotated, small, noisy and
//! unevenly lit. Each step here is a plain function over `GrayImage`, and
//! `prepare_for_ocr` composes them into the two binarised pages the OCR
//! pass consumes: an adaptive (local mean) threshold that copes with
//! shadows, and a global Otsu threshold for evenly lit scans.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, RgbImage};
use tracing::debug;

use super::types::OcrInputs;
use super::ExtractionError;
use crate::config::OcrConfig;

/// Maximum image size accepted (50 MB).
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// Smallest byte count a real PNG/JPEG can have.
const MIN_IMAGE_BYTES: usize = 67;

/// Validate image bytes before decoding.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let Ok(reader) = exif::Reader::new().read_from_container(&mut cursor) else {
        return 1;
    };
    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Decode and rotate upright.
pub fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ExtractionError::ImageProcessing(format!("Image decode failed: {e}")))?;
    Ok(apply_orientation(img, read_exif_orientation(bytes)))
}

/// ITU-R BT.601 luminance.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Upscale so neither side is below `min_dimension`. Larger images pass through.
pub fn upscale_small(gray: GrayImage, min_dimension: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 || (w >= min_dimension && h >= min_dimension) {
        return gray;
    }
    let scale = (min_dimension as f32 / h as f32).max(min_dimension as f32 / w as f32);
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    debug!(
        from = format!("{w}x{h}"),
        to = format!("{new_w}x{new_h}"),
        "Upscaling small report image"
    );
    image::imageops::resize(&gray, new_w, new_h, FilterType::CatmullRom)
}

/// Edge-preserving smoothing: each pixel becomes the mean of its
/// neighbourhood weighted by intensity similarity.
pub fn denoise_bilateral(gray: &GrayImage, radius: u32, range_sigma: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let two_sigma_sq = 2.0 * range_sigma * range_sigma;
    if radius == 0 || two_sigma_sq <= 0.0 {
        return gray.clone();
    }

    GrayImage::from_fn(w, h, |x, y| {
        let center = gray.get_pixel(x, y).0[0] as f32;
        let mut sum = 0.0f32;
        let mut weight_sum = 0.0f32;
        for ny in y.saturating_sub(radius)..(y + radius + 1).min(h) {
            for nx in x.saturating_sub(radius)..(x + radius + 1).min(w) {
                let value = gray.get_pixel(nx, ny).0[0] as f32;
                let diff = value - center;
                let weight = (-(diff * diff) / two_sigma_sq).exp();
                sum += value * weight;
                weight_sum += weight;
            }
        }
        if weight_sum > 0.0 {
            Luma([(sum / weight_sum).round().clamp(0.0, 255.0) as u8])
        } else {
            Luma([center as u8])
        }
    })
}

/// Gaussian sigma for a given odd block size, as the usual
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` rule.
fn block_sigma(block: u32) -> f32 {
    let k = block.max(3) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}

/// Local threshold: white where the pixel is brighter than its Gaussian
/// neighbourhood mean minus `offset`, black elsewhere.
pub fn adaptive_threshold(gray: &GrayImage, block: u32, offset: f32) -> GrayImage {
    let local_mean = image::imageops::blur(gray, block_sigma(block));
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0] as f32;
        let threshold = local_mean.get_pixel(x, y).0[0] as f32 - offset;
        Luma([if value > threshold { 255 } else { 0 }])
    })
}

/// Otsu's global threshold level (maximises between-class variance).
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;
    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_count += count;
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }
        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_count as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_count as f64;
        let gap = background_mean - foreground_mean;
        let variance = background_count as f64 * foreground_count as f64 * gap * gap;
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }
    best_level
}

pub fn otsu_threshold(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y).0[0] > level { 255 } else { 0 }])
    })
}

/// Encode a grayscale image as PNG bytes.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Full clean-up: validate, decode upright, grayscale, upscale, denoise,
/// then both binarisations.
pub fn prepare_for_ocr(bytes: &[u8], config: &OcrConfig) -> Result<OcrInputs, ExtractionError> {
    validate_image_bytes(bytes)?;
    let img = decode_upright(bytes)?;
    let gray = rgb_to_gray(&img.to_rgb8());
    let gray = upscale_small(gray, config.min_dimension);
    let smooth = denoise_bilateral(&gray, config.denoise_radius, config.denoise_sigma);

    let adaptive = adaptive_threshold(&smooth, config.adaptive_block, config.adaptive_offset);
    let otsu = otsu_threshold(&smooth);

    debug!(
        width = smooth.width(),
        height = smooth.height(),
        otsu_level = otsu_level(&smooth),
        "Report image prepared for OCR"
    );

    Ok(OcrInputs {
        adaptive_png: encode_png(&adaptive)?,
        otsu_png: encode_png(&otsu)?,
        width: smooth.width(),
        height: smooth.height(),
    })
}
