//! Structure extraction from a cleaned ink mask
//!
//! Three independent analyzers run over the same mask: text lines from the
//! horizontal projection, character candidates from component contours, and
//! text regions from a directional merge. Each call returns a fresh
//! collection; `Cached` keeps the last one for callers that need it later.

pub mod characters;
pub mod contours;
pub mod lines;
pub mod regions;

pub use characters::{CharacterCandidate, CharacterFilter, CharacterSegmenter};
pub use lines::{LineAnalysis, LineParams, LineSegmenter, TextLine};
pub use regions::{text_area_roi, RegionFilter, RegionSegmenter, TextRegion, DEFAULT_ROI_PADDING};

use image::{DynamicImage, GrayImage};
use serde::Serialize;

/// Axis-aligned box in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width over height; zero-height boxes report 0
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Grow by `padding` on every side, clamped to a `width` x `height` image
    pub fn expand_within(&self, padding: u32, width: u32, height: u32) -> BoundingBox {
        let x = self.x.saturating_sub(padding);
        let y = self.y.saturating_sub(padding);
        let right = self.right().saturating_add(padding).min(width);
        let bottom = self.bottom().saturating_add(padding).min(height);
        BoundingBox::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    /// Whether the vertical spans `[y, bottom)` intersect
    pub fn overlaps_rows(&self, top: u32, bottom: u32) -> bool {
        self.y < bottom && top < self.bottom()
    }
}

/// A mask analyzer that returns a fresh result collection per call
pub trait Segmenter {
    type Output: Clone + std::fmt::Debug;

    /// Identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Analyze a cleaned mask; invalid masks yield an empty list
    fn segment(&self, mask: &GrayImage) -> Vec<Self::Output>;
}

/// Wrapper that remembers the most recent result of a segmenter
///
/// Detection takes `&mut self`, so a cached instance cannot be shared
/// between concurrent callers; give each worker its own.
#[derive(Debug, Clone, Default)]
pub struct Cached<S: Segmenter> {
    inner: S,
    last: Vec<S::Output>,
}

impl<S: Segmenter> Cached<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: Vec::new(),
        }
    }

    /// Run the segmenter and keep a copy of its output
    pub fn detect(&mut self, mask: &GrayImage) -> Vec<S::Output> {
        self.last = self.inner.segment(mask);
        self.last.clone()
    }

    /// Output of the most recent `detect` call (empty before the first)
    pub fn last(&self) -> &[S::Output] {
        &self.last
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl Cached<RegionSegmenter> {
    /// Crop `image` to the padded union of the last detected regions
    ///
    /// Returns the image unchanged when nothing has been detected.
    pub fn get_text_area_roi(&self, image: &DynamicImage, padding: u32) -> DynamicImage {
        text_area_roi(image, &self.last, padding)
    }
}
