use super::contours::external_contours;
use super::{BoundingBox, Segmenter};
use crate::io::validate_mask;
use image::GrayImage;
use imageproc::point::Point;
use serde::Serialize;

/// Size and shape limits for character candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterFilter {
    pub min_area: f64,
    /// Largest area as a fraction of the whole image
    pub max_area_fraction: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for CharacterFilter {
    fn default() -> Self {
        Self {
            min_area: 20.0,
            max_area_fraction: 0.1,
            min_aspect: 0.1,
            max_aspect: 3.0,
            min_width: 3,
            min_height: 5,
            max_width: 200,
            max_height: 200,
        }
    }
}

impl CharacterFilter {
    fn accepts(&self, area: f64, bbox: &BoundingBox, image_area: f64) -> bool {
        if area < self.min_area || area > image_area * self.max_area_fraction {
            return false;
        }
        let aspect = bbox.aspect_ratio();
        (self.min_aspect..=self.max_aspect).contains(&aspect)
            && (self.min_width..=self.max_width).contains(&bbox.width)
            && (self.min_height..=self.max_height).contains(&bbox.height)
    }
}

/// A component that plausibly holds one glyph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterCandidate {
    /// Outer boundary in tracing order
    #[serde(skip)]
    pub contour: Vec<Point<u32>>,
    pub bbox: BoundingBox,
    /// Area enclosed by the contour
    pub area: f64,
    pub center: (u32, u32),
}

#[derive(Debug, Clone, Default)]
pub struct CharacterSegmenter {
    filter: CharacterFilter,
}

impl CharacterSegmenter {
    pub fn new(filter: CharacterFilter) -> Self {
        Self { filter }
    }

    /// Character candidates sorted by (y, x)
    ///
    /// The ordering follows reading order only where lines are visually
    /// separated; overlapping lines interleave.
    pub fn find_character_contours(&self, mask: &GrayImage) -> Vec<CharacterCandidate> {
        if !validate_mask(mask) {
            return Vec::new();
        }

        let image_area = mask.width() as f64 * mask.height() as f64;
        let contours = external_contours(mask);
        let total = contours.len();

        let mut characters: Vec<CharacterCandidate> = contours
            .into_iter()
            .filter(|c| self.filter.accepts(c.area, &c.bbox, image_area))
            .map(|c| CharacterCandidate {
                center: c.bbox.center(),
                bbox: c.bbox,
                area: c.area,
                contour: c.points,
            })
            .collect();
        characters.sort_by_key(|c| (c.bbox.y, c.bbox.x));

        tracing::debug!(
            contours = total,
            kept = characters.len(),
            "Character candidates found"
        );
        characters
    }
}

impl Segmenter for CharacterSegmenter {
    type Output = CharacterCandidate;

    fn name(&self) -> &'static str {
        "characters"
    }

    fn segment(&self, mask: &GrayImage) -> Vec<CharacterCandidate> {
        self.find_character_contours(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn test_glyph_sized_blobs_are_kept_in_reading_order() {
        let mut mask = GrayImage::new(200, 120);
        fill(&mut mask, 60, 20, 10, 15);
        fill(&mut mask, 20, 20, 8, 14);
        fill(&mut mask, 30, 70, 12, 16);

        let chars = CharacterSegmenter::default().find_character_contours(&mask);

        let boxes: Vec<(u32, u32)> = chars.iter().map(|c| (c.bbox.x, c.bbox.y)).collect();
        assert_eq!(boxes, vec![(20, 20), (60, 20), (30, 70)]);
        assert_eq!(chars[0].center, (24, 27));
        assert!(!chars[0].contour.is_empty());
    }

    #[test]
    fn test_rejects_specks_lines_and_page_blobs() {
        let mut mask = GrayImage::new(300, 300);
        fill(&mut mask, 10, 10, 3, 3); // speck
        fill(&mut mask, 10, 50, 120, 6); // horizontal rule, aspect 20
        fill(&mut mask, 150, 20, 2, 30); // hairline, w < 3
        fill(&mut mask, 100, 100, 120, 120); // area > 10% of image
        fill(&mut mask, 40, 250, 10, 12); // plausible glyph

        let chars = CharacterSegmenter::default().find_character_contours(&mask);

        assert_eq!(chars.len(), 1);
        assert_eq!(chars[0].bbox, BoundingBox::new(40, 250, 10, 12));
    }

    #[test]
    fn test_candidates_satisfy_filter_limits() {
        let mut mask = GrayImage::new(400, 300);
        for i in 0..12u32 {
            fill(&mut mask, 10 + i * 30, 20 + (i % 4) * 60, 3 + i * 2, 5 + (i * 7) % 40);
        }

        let chars = CharacterSegmenter::default().find_character_contours(&mask);
        let image_area = 400.0 * 300.0;

        assert!(!chars.is_empty());
        for c in &chars {
            let aspect = c.bbox.width as f64 / c.bbox.height as f64;
            assert!(c.area >= 20.0 && c.area <= 0.1 * image_area);
            assert!((0.1..=3.0).contains(&aspect));
            assert!((3..=200).contains(&c.bbox.width));
            assert!((5..=200).contains(&c.bbox.height));
        }
    }

    #[test]
    fn test_blank_and_invalid_masks_are_empty() {
        let segmenter = CharacterSegmenter::default();
        assert!(segmenter.find_character_contours(&GrayImage::new(100, 100)).is_empty());

        let mut small = GrayImage::new(30, 30);
        fill(&mut small, 5, 5, 8, 10);
        assert!(segmenter.find_character_contours(&small).is_empty());
    }
}
