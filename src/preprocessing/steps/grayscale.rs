use image::{DynamicImage, GrayImage};

/// Convert a color or grayscale page to a single luma channel
///
/// Grayscale input is copied through unchanged
pub fn apply(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_grayscale_converts_color() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let gray = apply(&DynamicImage::ImageRgb8(img));

        assert!(gray.get_pixel(0, 0).0[0] > 0);
        assert!(gray.get_pixel(1, 0).0[0] > gray.get_pixel(2, 0).0[0]);
        assert_eq!(gray.get_pixel(5, 5).0[0], 0);
    }

    #[test]
    fn test_grayscale_passes_luma_through() {
        let img = GrayImage::from_fn(100, 50, |x, y| Luma([((x + y) % 256) as u8]));
        let gray = apply(&DynamicImage::ImageLuma8(img.clone()));
        assert_eq!(gray, img);
    }
}
