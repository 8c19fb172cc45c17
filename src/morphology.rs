//! Structuring elements for binary morphology
//!
//! Elements are rendered as hit grids and turned into `imageproc` masks, so
//! the operators themselves are `imageproc::morphology::grayscale_*`. On a
//! 0/255 mask those are exactly binary dilation and erosion, and neighbours
//! outside the image are ignored.

use image::{GrayImage, Luma};
use imageproc::morphology::Mask;

/// Largest side accepted for an element; the anchor must fit in a `u8`
const MAX_SIDE: u32 = 255;

/// Structuring element: a `width` x `height` grid of hits anchored at `size / 2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    grid: GrayImage,
}

impl StructuringElement {
    /// Filled rectangle
    pub fn rect(width: u32, height: u32) -> Self {
        let (width, height) = clamp_size(width, height);
        Self {
            grid: GrayImage::from_pixel(width, height, Luma([255])),
        }
    }

    /// Ellipse inscribed in a `width` x `height` box
    ///
    /// Row `i` is filled over `[c - dx, c + dx]` where
    /// `dx = round(c * sqrt(1 - ((i - r) / r)^2))`, `r = height / 2`,
    /// `c = width / 2`. A 3x3 ellipse is a cross; a 2x2 ellipse drops the
    /// top-left corner.
    pub fn ellipse(width: u32, height: u32) -> Self {
        let (width, height) = clamp_size(width, height);
        let r = (height / 2) as i32;
        let c = (width / 2) as i32;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut grid = GrayImage::new(width, height);
        for i in 0..height as i32 {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(width as i32);
            for j in j1..j2 {
                grid.put_pixel(j as u32, i as u32, Luma([255]));
            }
        }

        Self { grid }
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn is_hit(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.grid.get_pixel(x, y).0[0] != 0
    }

    /// `imageproc` mask with the anchor at `(width / 2, height / 2)`
    pub fn mask(&self) -> Mask {
        Mask::from_image(
            &self.grid,
            (self.width() / 2) as u8,
            (self.height() / 2) as u8,
        )
    }
}

fn clamp_size(width: u32, height: u32) -> (u32, u32) {
    (width.clamp(1, MAX_SIDE), height.clamp(1, MAX_SIDE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::morphology::{grayscale_close, grayscale_dilate, grayscale_open};

    fn hit_grid(element: &StructuringElement) -> Vec<Vec<bool>> {
        (0..element.height())
            .map(|y| (0..element.width()).map(|x| element.is_hit(x, y)).collect())
            .collect()
    }

    #[test]
    fn test_ellipse_3x3_is_cross() {
        let grid = hit_grid(&StructuringElement::ellipse(3, 3));
        assert_eq!(
            grid,
            vec![
                vec![false, true, false],
                vec![true, true, true],
                vec![false, true, false],
            ]
        );
    }

    #[test]
    fn test_ellipse_2x2_drops_top_left() {
        let grid = hit_grid(&StructuringElement::ellipse(2, 2));
        assert_eq!(grid, vec![vec![false, true], vec![true, true]]);
    }

    #[test]
    fn test_open_removes_isolated_pixel_keeps_block() {
        let mut img = GrayImage::new(20, 20);
        img.put_pixel(2, 2, Luma([255]));
        for y in 8..16 {
            for x in 8..16 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        let opened = grayscale_open(&img, &StructuringElement::ellipse(3, 3).mask());

        assert_eq!(opened.get_pixel(2, 2).0[0], 0);
        assert_eq!(opened.get_pixel(12, 12).0[0], 255);
    }

    #[test]
    fn test_horizontal_close_does_not_bridge_rows() {
        // Two horizontal strokes with a 2px horizontal gap and a 1px vertical gap
        let mut img = GrayImage::new(30, 10);
        for x in (2..10).chain(12..20) {
            img.put_pixel(x, 3, Luma([255]));
            img.put_pixel(x, 5, Luma([255]));
        }

        let closed = grayscale_close(&img, &StructuringElement::rect(5, 1).mask());

        assert_eq!(closed.get_pixel(10, 3).0[0], 255);
        assert_eq!(closed.get_pixel(11, 5).0[0], 255);
        assert_eq!(closed.get_pixel(6, 4).0[0], 0);
    }

    #[test]
    fn test_dilate_2x2_grows_toward_bottom_right() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([255]));

        let dilated = grayscale_dilate(&img, &StructuringElement::rect(2, 2).mask());

        // Anchor (1,1): output (x,y) looks at (x-1..=x, y-1..=y)
        assert_eq!(dilated.get_pixel(2, 2).0[0], 255);
        assert_eq!(dilated.get_pixel(3, 3).0[0], 255);
        assert_eq!(dilated.get_pixel(1, 1).0[0], 0);
        assert_eq!(dilated.pixels().filter(|p| p.0[0] == 255).count(), 4);
    }

    #[test]
    fn test_erosion_ignores_pixels_outside_image() {
        // Ink touching the border survives an open: the border is neutral
        let img = GrayImage::from_fn(10, 10, |x, _| if x < 4 { Luma([255]) } else { Luma([0]) });

        let opened = grayscale_open(&img, &StructuringElement::ellipse(3, 3).mask());

        assert_eq!(opened.get_pixel(0, 0).0[0], 255);
        assert_eq!(opened.get_pixel(0, 5).0[0], 255);
        assert_eq!(opened.get_pixel(5, 5).0[0], 0);
    }
}
