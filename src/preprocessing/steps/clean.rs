use super::threshold::{BACKGROUND, INK};
use crate::morphology::StructuringElement;
use image::{GrayImage, Luma};
use imageproc::filter::median_filter;
use imageproc::morphology::{grayscale_close, grayscale_open};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Median window radius (5x5)
const MEDIAN_RADIUS: u32 = 2;
/// Components smaller than this many pixels are dropped
pub const MIN_COMPONENT_AREA: u32 = 10;

/// Clean a binary ink mask
///
/// Order matters: impulse noise and protrusions are removed before
/// component filtering so thin strokes are not mistaken for speckle, and
/// the closing runs last so it cannot revive filtered noise.
pub fn apply(mask: &GrayImage) -> GrayImage {
    let denoised = median_filter(mask, MEDIAN_RADIUS, MEDIAN_RADIUS);
    let opened = grayscale_open(&denoised, &StructuringElement::ellipse(3, 3).mask());
    let filtered = remove_small_components(&opened, MIN_COMPONENT_AREA);
    grayscale_close(&filtered, &StructuringElement::ellipse(2, 2).mask())
}

/// Keep only 8-connected ink components with at least `min_area` pixels
pub fn remove_small_components(mask: &GrayImage, min_area: u32) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));

    let mut areas: Vec<u32> = Vec::new();
    for label in labels.pixels() {
        let id = label.0[0] as usize;
        if id == 0 {
            continue;
        }
        if id >= areas.len() {
            areas.resize(id + 1, 0);
        }
        areas[id] += 1;
    }

    let dropped = areas
        .iter()
        .skip(1)
        .filter(|&&area| area > 0 && area < min_area)
        .count();
    tracing::debug!(
        components = areas.len().saturating_sub(1),
        dropped,
        "Filtered small components"
    );

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let id = labels.get_pixel(x, y).0[0] as usize;
        if id != 0 && areas[id] >= min_area {
            Luma([INK])
        } else {
            Luma([BACKGROUND])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_count(img: &GrayImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0[0] == INK)
            .count()
    }

    #[test]
    fn test_removes_dot_keeps_blob() {
        let mut mask = GrayImage::new(100, 100);
        // 20x10 = 200 pixel blob
        for y in 30..40 {
            for x in 20..40 {
                mask.put_pixel(x, y, Luma([INK]));
            }
        }
        // 5 pixel plus-shaped dot
        for (x, y) in [(80, 80), (79, 80), (81, 80), (80, 79), (80, 81)] {
            mask.put_pixel(x, y, Luma([INK]));
        }

        let cleaned = apply(&mask);

        assert_eq!(ink_count(&cleaned, 70..90, 70..90), 0);
        let blob = ink_count(&cleaned, 15..45, 25..45);
        assert!((170..=230).contains(&blob), "blob area {}", blob);
        assert_eq!(cleaned.get_pixel(30, 35).0[0], INK);
    }

    #[test]
    fn test_remove_small_components_threshold() {
        let mut mask = GrayImage::new(60, 60);
        // 9 pixels: dropped
        for x in 5..14 {
            mask.put_pixel(x, 5, Luma([INK]));
        }
        // 10 pixels on a diagonal, 8-connected: kept
        for i in 0..10 {
            mask.put_pixel(20 + i, 20 + i, Luma([INK]));
        }

        let filtered = remove_small_components(&mask, MIN_COMPONENT_AREA);

        assert_eq!(filtered.get_pixel(8, 5).0[0], BACKGROUND);
        assert_eq!(filtered.get_pixel(25, 25).0[0], INK);
        assert_eq!(ink_count(&filtered, 0..60, 0..60), 10);
    }

    #[test]
    fn test_output_is_binary_and_same_size() {
        let mask = GrayImage::from_fn(64, 64, |x, y| {
            if (x * 7 + y * 13) % 11 == 0 {
                Luma([INK])
            } else {
                Luma([BACKGROUND])
            }
        });

        let cleaned = apply(&mask);

        assert_eq!(cleaned.dimensions(), (64, 64));
        assert!(cleaned.pixels().all(|p| p.0[0] == INK || p.0[0] == BACKGROUND));
    }
}
