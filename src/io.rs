//! Image loading, saving, and the shared validity predicate
//!
//! File decode/encode is delegated to the `image` crate; this module only
//! maps its failures onto `PipelineError` and enforces the input contract.

use crate::error::PipelineError;
use image::{ColorType, DynamicImage, GrayImage};
use serde::Serialize;
use std::path::Path;

/// Smallest width or height accepted by any pipeline operation
pub const MIN_DIMENSION: u32 = 50;

/// How a file should be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Decode to 3-channel RGB
    #[default]
    Color,
    /// Decode to 1-channel luma
    Grayscale,
}

/// Basic facts about an image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub aspect_ratio: f64,
}

/// Load an image from disk
///
/// A missing file or a decode failure is reported as `SourceUnavailable`,
/// never as an empty image.
pub fn load_image(path: &Path, mode: ColorMode) -> Result<DynamicImage, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    let decoded = image::open(path).map_err(|e| PipelineError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(match mode {
        ColorMode::Color => DynamicImage::ImageRgb8(decoded.into_rgb8()),
        ColorMode::Grayscale => DynamicImage::ImageLuma8(decoded.into_luma8()),
    })
}

/// Save an image, creating missing parent directories
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
    let output_error = |reason: String| PipelineError::Output {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| output_error(e.to_string()))?;
    }

    image.save(path).map_err(|e| output_error(e.to_string()))
}

/// Number of 8-bit channels, or `None` for layouts the pipeline does not accept
pub fn channel_count(image: &DynamicImage) -> Option<u8> {
    match image.color() {
        ColorType::L8 => Some(1),
        ColorType::Rgb8 => Some(3),
        _ => None,
    }
}

/// Check whether an image is usable as pipeline input
///
/// True iff the image is present, has 1 or 3 channels, is non-empty,
/// and is at least `MIN_DIMENSION` pixels in both directions.
pub fn validate_image(image: Option<&DynamicImage>) -> bool {
    let Some(image) = image else {
        return false;
    };
    if channel_count(image).is_none() {
        return false;
    }
    has_valid_dimensions(image.width(), image.height())
}

/// Validity predicate for single-channel masks
pub fn validate_mask(mask: &GrayImage) -> bool {
    has_valid_dimensions(mask.width(), mask.height())
}

fn has_valid_dimensions(width: u32, height: u32) -> bool {
    width > 0 && height > 0 && width >= MIN_DIMENSION && height >= MIN_DIMENSION
}

/// Describe an image's dimensions and channel layout
pub fn image_info(image: &DynamicImage) -> ImageInfo {
    let (width, height) = (image.width(), image.height());
    ImageInfo {
        width,
        height,
        channels: image.color().channel_count(),
        aspect_ratio: if height == 0 {
            0.0
        } else {
            width as f64 / height as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage, RgbaImage};

    #[test]
    fn test_validate_rejects_missing_image() {
        assert!(!validate_image(None));
    }

    #[test]
    fn test_validate_accepts_gray_and_rgb() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(50, 50));
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(120, 80));
        assert!(validate_image(Some(&gray)));
        assert!(validate_image(Some(&rgb)));
    }

    #[test]
    fn test_validate_rejects_small_or_four_channel() {
        let narrow = DynamicImage::ImageLuma8(GrayImage::new(49, 200));
        let short = DynamicImage::ImageRgb8(RgbImage::new(200, 49));
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(100, 100));
        assert!(!validate_image(Some(&narrow)));
        assert!(!validate_image(Some(&short)));
        assert!(!validate_image(Some(&empty)));
        assert!(!validate_image(Some(&rgba)));
    }

    #[test]
    fn test_load_missing_file_is_source_unavailable() {
        let err = load_image(Path::new("/nonexistent/page.png"), ColorMode::Color).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_load_undecodable_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = load_image(&path, ColorMode::Grayscale).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_save_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mask.png");
        let mask = GrayImage::from_fn(60, 60, |x, _| Luma([if x < 30 { 0 } else { 255 }]));

        save_image(&DynamicImage::ImageLuma8(mask.clone()), &path).unwrap();
        let loaded = load_image(&path, ColorMode::Grayscale).unwrap();

        assert_eq!(loaded.to_luma8(), mask);
        assert_eq!(load_image(&path, ColorMode::Color).unwrap().color(), ColorType::Rgb8);
    }

    #[test]
    fn test_image_info_reports_channels_and_aspect() {
        let info = image_info(&DynamicImage::ImageRgb8(RgbImage::new(200, 100)));
        assert_eq!(info.width, 200);
        assert_eq!(info.height, 100);
        assert_eq!(info.channels, 3);
        assert!((info.aspect_ratio - 2.0).abs() < 1e-9);
    }
}
