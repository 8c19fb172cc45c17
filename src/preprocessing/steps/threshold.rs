use super::denoise::{gaussian_kernel, gaussian_smooth};
use crate::error::PipelineError;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use std::str::FromStr;

/// Adaptive threshold neighbourhood (pixels per side)
const ADAPTIVE_BLOCK_SIZE: u32 = 11;
/// Offset subtracted from the local weighted mean
const ADAPTIVE_OFFSET: i32 = 2;
/// Threshold used by the fixed strategy
const FIXED_LEVEL: u8 = 127;

pub const INK: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Binarization strategies
///
/// Every strategy marks dark strokes as ink (255) and paper as background (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMethod {
    /// Gaussian-weighted local mean over 11x11, minus 2
    #[default]
    Adaptive,
    /// Global Otsu level
    Otsu,
    /// Global level 127
    Simple,
}

impl ThresholdMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::Otsu => "otsu",
            Self::Simple => "simple",
        }
    }
}

impl FromStr for ThresholdMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adaptive" => Ok(Self::Adaptive),
            "otsu" => Ok(Self::Otsu),
            "simple" | "fixed" => Ok(Self::Simple),
            other => Err(PipelineError::Config(format!(
                "unknown threshold method '{}' (expected adaptive, otsu or simple)",
                other
            ))),
        }
    }
}

/// Binarize a grayscale image with the selected strategy
pub fn apply(image: &GrayImage, method: ThresholdMethod) -> GrayImage {
    match method {
        ThresholdMethod::Adaptive => {
            adaptive_gaussian_threshold(image, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET)
        }
        ThresholdMethod::Otsu => global_threshold(image, otsu_level(image)),
        ThresholdMethod::Simple => global_threshold(image, FIXED_LEVEL),
    }
}

/// Ink wherever a pixel is at or below `level`
pub fn global_threshold(image: &GrayImage, level: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { BACKGROUND } else { INK };
    }
    out
}

/// Local adaptive thresholding against a Gaussian-weighted neighbourhood mean
///
/// A pixel is ink when it is darker than the rounded local mean by at least
/// `offset` levels; flat paper therefore stays background.
pub fn adaptive_gaussian_threshold(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let kernel = gaussian_kernel(block_size, 0.0);
    let means = gaussian_smooth(image, &kernel);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let mean = means.get_pixel(x, y).0[0].round() as i32;
        let pixel = image.get_pixel(x, y).0[0] as i32;
        if pixel - mean > -offset {
            Luma([BACKGROUND])
        } else {
            Luma([INK])
        }
    })
}
