use crate::error::PipelineError;
use crate::io::{channel_count, validate_image, validate_mask};
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::borrow::Cow;
use std::time::Instant;

use super::steps;
use super::steps::contrast::ContrastMethod;
use super::steps::denoise::DenoiseMethod;
use super::steps::threshold::ThresholdMethod;

/// Strategy selection for the three conditioning stages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConditionerConfig {
    pub contrast: ContrastMethod,
    pub denoise: DenoiseMethod,
    pub threshold: ThresholdMethod,
}

/// Optional size adjustments applied before conditioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    /// Aspect-preserving resize targets (width, height)
    pub resize: (Option<u32>, Option<u32>),
    /// Fit into a centered black canvas of this size
    pub canvas: Option<(u32, u32)>,
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Sizes and channel counts before and after preprocessing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessingInfo {
    pub original_size: (u32, u32),
    pub processed_size: (u32, u32),
    pub original_channels: u8,
    pub processed_channels: u8,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Cleaned binary mask (not serialized)
    #[serde(skip)]
    pub mask: GrayImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
    pub info: PreprocessingInfo,
}

/// Turns a color or grayscale page into a binary ink mask
///
/// Stages always run in the order grayscale, contrast, denoise, binarize.
#[derive(Debug, Clone, Default)]
pub struct ImageConditioner {
    config: ConditionerConfig,
}

impl ImageConditioner {
    pub fn new(config: ConditionerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConditionerConfig {
        &self.config
    }

    /// Produce a binary mask (ink = 255) with the input's dimensions
    pub fn condition(&self, image: &DynamicImage) -> Result<GrayImage, PipelineError> {
        self.condition_timed(image, &mut Vec::new())
    }

    fn condition_timed(
        &self,
        image: &DynamicImage,
        timings: &mut Vec<StepTiming>,
    ) -> Result<GrayImage, PipelineError> {
        ensure_valid(image)?;

        let gray = run_step("grayscale", timings, || steps::grayscale::apply(image));
        let contrast = self.config.contrast;
        let enhanced = run_step(contrast.as_str(), timings, || {
            steps::contrast::apply(&gray, contrast)
        });
        let denoise = self.config.denoise;
        let smoothed = run_step(denoise.as_str(), timings, || {
            steps::denoise::apply(&enhanced, denoise)
        });
        let threshold = self.config.threshold;
        Ok(run_step(threshold.as_str(), timings, || {
            steps::threshold::apply(&smoothed, threshold)
        }))
    }
}

/// Removes speckle and resmooths strokes on a binary mask
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCleaner;

impl BinaryCleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, mask: &GrayImage) -> Result<GrayImage, PipelineError> {
        if !validate_mask(mask) {
            return Err(PipelineError::InvalidImage(format!(
                "mask must be at least 50x50, got {}x{}",
                mask.width(),
                mask.height()
            )));
        }
        Ok(steps::clean::apply(mask))
    }
}

/// Optional resizing, then conditioning followed by cleanup
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    geometry: Geometry,
    conditioner: ImageConditioner,
    cleaner: BinaryCleaner,
}

impl Pipeline {
    pub fn new(config: ConditionerConfig) -> Self {
        Self {
            geometry: Geometry::default(),
            conditioner: ImageConditioner::new(config),
            cleaner: BinaryCleaner::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn conditioner(&self) -> &ImageConditioner {
        &self.conditioner
    }

    /// Process a page into a cleaned mask with per-step timings
    pub fn process(&self, image: &DynamicImage) -> Result<PreprocessingResult, PipelineError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        ensure_valid(image)?;
        let prepared = self.prepare(image, &mut steps_timing);
        let binary = self
            .conditioner
            .condition_timed(&prepared, &mut steps_timing)?;
        let mask = run_step("clean", &mut steps_timing, || self.cleaner.clean(&binary))?;

        let info = PreprocessingInfo {
            original_size: (image.width(), image.height()),
            processed_size: mask.dimensions(),
            original_channels: channel_count(image).unwrap_or_default(),
            processed_channels: 1,
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            total_time_ms,
            contrast = self.conditioner.config.contrast.as_str(),
            denoise = self.conditioner.config.denoise.as_str(),
            threshold = self.conditioner.config.threshold.as_str(),
            "Preprocessing finished"
        );

        Ok(PreprocessingResult {
            mask,
            total_time_ms,
            steps: steps_timing,
            info,
        })
    }

    fn prepare<'a>(
        &self,
        image: &'a DynamicImage,
        timings: &mut Vec<StepTiming>,
    ) -> Cow<'a, DynamicImage> {
        let mut prepared = Cow::Borrowed(image);
        let (width, height) = self.geometry.resize;
        if width.is_some() || height.is_some() {
            let resized = run_step("resize", timings, || {
                steps::resize::apply(prepared.into_owned(), width, height)
            });
            prepared = Cow::Owned(resized);
        }
        if let Some(canvas) = self.geometry.canvas {
            let normalized = run_step("normalize", timings, || {
                steps::normalize::apply(&prepared, canvas)
            });
            prepared = Cow::Owned(normalized);
        }
        prepared
    }
}

fn ensure_valid(image: &DynamicImage) -> Result<(), PipelineError> {
    if validate_image(Some(image)) {
        return Ok(());
    }
    Err(PipelineError::InvalidImage(format!(
        "expected 1 or 3 channels and at least 50x50, got {:?} at {}x{}",
        image.color(),
        image.width(),
        image.height()
    )))
}

fn run_step<T, F>(name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> T
where
    F: FnOnce() -> T,
{
    let step_start = Instant::now();
    let result = step_fn();
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    result
}
