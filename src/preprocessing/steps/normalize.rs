use super::resize::scaled;
use image::{imageops::overlay, imageops::FilterType, DynamicImage, GrayImage, RgbImage};

/// Default canvas size (width, height)
pub const DEFAULT_CANVAS: (u32, u32) = (800, 600);

/// Fit an image into a black canvas of exactly `target` size
///
/// The image is scaled to fit while keeping its aspect ratio and centered;
/// the uncovered margin stays 0. Grayscale input gives a grayscale canvas,
/// anything else an RGB canvas.
pub fn apply(image: &DynamicImage, target: (u32, u32)) -> DynamicImage {
    let (target_width, target_height) = (target.0.max(1), target.1.max(1));
    let (width, height) = (image.width().max(1), image.height().max(1));

    let scale = (target_width as f32 / width as f32).min(target_height as f32 / height as f32);
    let (new_width, new_height) = scaled(width, height, scale);
    let (new_width, new_height) = (new_width.min(target_width), new_height.min(target_height));

    let resized = image.resize_exact(new_width, new_height, FilterType::Triangle);
    let x_offset = ((target_width - new_width) / 2) as i64;
    let y_offset = ((target_height - new_height) / 2) as i64;

    match resized {
        DynamicImage::ImageLuma8(gray) => {
            let mut canvas = GrayImage::new(target_width, target_height);
            overlay(&mut canvas, &gray, x_offset, y_offset);
            DynamicImage::ImageLuma8(canvas)
        }
        other => {
            let mut canvas = RgbImage::new(target_width, target_height);
            overlay(&mut canvas, &other.to_rgb8(), x_offset, y_offset);
            DynamicImage::ImageRgb8(canvas)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_normalize_centers_wide_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 100, Luma([200])));
        let result = apply(&img, DEFAULT_CANVAS).to_luma8();

        assert_eq!(result.dimensions(), (800, 600));
        // Scaled to 800x200, placed at y = 200
        assert_eq!(result.get_pixel(400, 100).0[0], 0);
        assert_eq!(result.get_pixel(400, 300).0[0], 200);
        assert_eq!(result.get_pixel(400, 500).0[0], 0);
    }

    #[test]
    fn test_normalize_keeps_color_channels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 60, Rgb([10, 20, 30])));
        let result = apply(&img, (120, 240));

        assert!(matches!(result, DynamicImage::ImageRgb8(_)));
        assert_eq!(result.to_rgb8().get_pixel(60, 120), &Rgb([10, 20, 30]));
        assert_eq!(result.to_rgb8().get_pixel(60, 10), &Rgb([0, 0, 0]));
    }
}
