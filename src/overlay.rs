//! Debug overlays: detected boxes drawn over the mask

use crate::segmentation::BoundingBox;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

pub const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CHARACTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const REGION_COLOR: Rgb<u8> = Rgb([0, 128, 255]);

/// Render `mask` in RGB with a 2px outline around each box
pub fn draw_boxes<'a, I>(mask: &GrayImage, boxes: I, color: Rgb<u8>) -> RgbImage
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    let mut canvas = DynamicImage::ImageLuma8(mask.clone()).to_rgb8();
    for b in boxes {
        if b.width == 0 || b.height == 0 {
            continue;
        }
        let outer = Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height);
        draw_hollow_rect_mut(&mut canvas, outer, color);
        if b.width > 2 && b.height > 2 {
            let inner = Rect::at(b.x as i32 + 1, b.y as i32 + 1).of_size(b.width - 2, b.height - 2);
            draw_hollow_rect_mut(&mut canvas, inner, color);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_draw_boxes_outlines_without_filling() {
        let mask = GrayImage::from_pixel(60, 60, Luma([0]));
        let boxes = [BoundingBox::new(10, 10, 20, 20)];

        let canvas = draw_boxes(&mask, boxes.iter(), LINE_COLOR);

        assert_eq!(canvas.dimensions(), (60, 60));
        assert_eq!(canvas.get_pixel(10, 10), &LINE_COLOR);
        assert_eq!(canvas.get_pixel(29, 20), &LINE_COLOR);
        assert_eq!(canvas.get_pixel(11, 20), &LINE_COLOR);
        assert_eq!(canvas.get_pixel(20, 20), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_mask_ink_stays_white() {
        let mask = GrayImage::from_pixel(60, 60, Luma([255]));
        let canvas = draw_boxes(&mask, std::iter::empty::<&BoundingBox>(), REGION_COLOR);
        assert!(canvas.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }
}
