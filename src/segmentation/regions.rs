use super::contours::external_contours;
use super::{BoundingBox, Segmenter};
use crate::io::{validate_image, validate_mask};
use crate::morphology::StructuringElement;
use image::{DynamicImage, GrayImage};
use imageproc::morphology::{grayscale_close, grayscale_dilate};
use serde::Serialize;

/// Padding applied around the text area crop
pub const DEFAULT_ROI_PADDING: u32 = 20;

/// Limits for text region blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionFilter {
    pub min_area: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self {
            min_area: 200.0,
            min_aspect: 0.1,
            max_aspect: 15.0,
        }
    }
}

/// A block of merged glyphs, usually one line or a word group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextRegion {
    pub bbox: BoundingBox,
    /// Area enclosed by the merged block's contour
    pub area: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RegionSegmenter {
    filter: RegionFilter,
}

impl RegionSegmenter {
    pub fn new(filter: RegionFilter) -> Self {
        Self { filter }
    }

    /// Text regions sorted top to bottom
    pub fn find_text_regions(&self, mask: &GrayImage) -> Vec<TextRegion> {
        if !validate_mask(mask) {
            return Vec::new();
        }

        let merged = merge_glyphs(mask);
        let contours = external_contours(&merged);
        let total = contours.len();

        let mut regions: Vec<TextRegion> = contours
            .into_iter()
            .filter(|c| {
                c.area >= self.filter.min_area
                    && (self.filter.min_aspect..=self.filter.max_aspect)
                        .contains(&c.bbox.aspect_ratio())
            })
            .map(|c| TextRegion {
                bbox: c.bbox,
                area: c.area,
            })
            .collect();
        regions.sort_by_key(|r| r.bbox.y);

        tracing::debug!(contours = total, kept = regions.len(), "Text regions found");
        regions
    }
}

impl Segmenter for RegionSegmenter {
    type Output = TextRegion;

    fn name(&self) -> &'static str {
        "regions"
    }

    fn segment(&self, mask: &GrayImage) -> Vec<TextRegion> {
        self.find_text_regions(mask)
    }
}

/// Join glyphs horizontally without bridging neighbouring lines
///
/// The closing kernel is one row tall, so it never connects ink across rows;
/// the 2x2 dilation afterwards only closes pixel-sized gaps.
pub fn merge_glyphs(mask: &GrayImage) -> GrayImage {
    let closed = grayscale_close(mask, &StructuringElement::rect(5, 1).mask());
    grayscale_dilate(&closed, &StructuringElement::rect(2, 2).mask())
}

/// Padded union of all region boxes, clamped to `width` x `height`
pub fn text_area_bounds(
    regions: &[TextRegion],
    padding: u32,
    width: u32,
    height: u32,
) -> Option<BoundingBox> {
    let (first, rest) = regions.split_first()?;
    let union = rest.iter().fold(first.bbox, |acc, r| acc.union(&r.bbox));
    Some(union.expand_within(padding, width, height))
}

/// Crop an image to the padded area covered by `regions`
///
/// With no regions, or an invalid image, the input is returned unchanged.
pub fn text_area_roi(image: &DynamicImage, regions: &[TextRegion], padding: u32) -> DynamicImage {
    if !validate_image(Some(image)) {
        return image.clone();
    }
    match text_area_bounds(regions, padding, image.width(), image.height()) {
        Some(b) if b.width > 0 && b.height > 0 => image.crop_imm(b.x, b.y, b.width, b.height),
        _ => image.clone(),
    }
}
