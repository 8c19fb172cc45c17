use crate::error::PipelineError;
use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::{bilateral_filter, median_filter, separable_filter_equal};
use imageproc::map::map_colors;
use std::str::FromStr;

/// Bilateral window diameter in pixels
const BILATERAL_DIAMETER: u32 = 9;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPACE: f32 = 75.0;
/// Gaussian blur kernel size
const GAUSSIAN_KSIZE: u32 = 5;
/// Median blur kernel size
const MEDIAN_KSIZE: u32 = 5;

/// Noise reduction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenoiseMethod {
    /// Edge-preserving smoothing (diameter 9, sigma 75/75)
    #[default]
    Bilateral,
    /// 5x5 Gaussian blur
    Gaussian,
    /// 5x5 median blur
    Median,
}

impl DenoiseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bilateral => "bilateral",
            Self::Gaussian => "gaussian",
            Self::Median => "median",
        }
    }
}

impl FromStr for DenoiseMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bilateral" => Ok(Self::Bilateral),
            "gaussian" => Ok(Self::Gaussian),
            "median" => Ok(Self::Median),
            other => Err(PipelineError::Config(format!(
                "unknown denoise method '{}' (expected bilateral, gaussian or median)",
                other
            ))),
        }
    }
}

/// Reduce noise with the selected strategy
pub fn apply(image: &GrayImage, method: DenoiseMethod) -> GrayImage {
    match method {
        DenoiseMethod::Bilateral if image.is_empty() => image.clone(),
        DenoiseMethod::Bilateral => bilateral_filter(
            image,
            BILATERAL_DIAMETER,
            BILATERAL_SIGMA_COLOR,
            BILATERAL_SIGMA_SPACE,
        ),
        DenoiseMethod::Gaussian => gaussian_blur(image, GAUSSIAN_KSIZE, 0.0),
        DenoiseMethod::Median => median_filter(image, MEDIAN_KSIZE / 2, MEDIAN_KSIZE / 2),
    }
}

/// Gaussian sigma implied by a kernel size when none is given
fn default_sigma(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of odd length `ksize`
///
/// A non-positive `sigma` is derived from the kernel size.
pub fn gaussian_kernel(ksize: u32, sigma: f32) -> Vec<f32> {
    let ksize = ksize.max(1) | 1;
    let sigma = if sigma > 0.0 { sigma } else { default_sigma(ksize) };
    let half = (ksize / 2) as i32;
    let denom = 2.0 * sigma * sigma;

    let weights: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian blur with replicated borders
pub fn gaussian_blur(image: &GrayImage, ksize: u32, sigma: f32) -> GrayImage {
    let smoothed = gaussian_smooth(image, &gaussian_kernel(ksize, sigma));
    map_colors(&smoothed, |p| Luma([p.0[0].round().clamp(0.0, 255.0) as u8]))
}

/// Separable convolution at `f32` precision, without rounding
pub(crate) fn gaussian_smooth(image: &GrayImage, kernel: &[f32]) -> Image<Luma<f32>> {
    let values: Image<Luma<f32>> = map_colors(image, |p| Luma([p.0[0] as f32]));
    separable_filter_equal(&values, kernel)
}
