use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Resize an image while keeping its aspect ratio
///
/// With both targets the smaller scale factor wins so the result fits inside
/// `target_width` x `target_height`. With one target the other side follows
/// the aspect ratio. With neither the image is returned unchanged.
pub fn apply(
    image: DynamicImage,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image;
    }

    let (new_width, new_height) = match (target_width, target_height) {
        (None, None) => return image,
        (Some(tw), Some(th)) => {
            let scale = (tw as f32 / width as f32).min(th as f32 / height as f32);
            scaled(width, height, scale)
        }
        (Some(tw), None) => {
            let scale = tw as f32 / width as f32;
            (tw, scaled(width, height, scale).1)
        }
        (None, Some(th)) => {
            let scale = th as f32 / height as f32;
            (scaled(width, height, scale).0, th)
        }
    };

    if (new_width, new_height) == (width, height) {
        return image;
    }

    image.resize_exact(new_width.max(1), new_height.max(1), FilterType::Lanczos3)
}

/// Scale both sides, truncating toward zero
pub(crate) fn scaled(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        ((width as f32 * scale) as u32).max(1),
        ((height as f32 * scale) as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_resize_fits_inside_both_targets() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(400, 200));
        let result = apply(img, Some(100), Some(100));
        assert_eq!(result.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_single_target_keeps_aspect() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(300, 150));
        assert_eq!(apply(img.clone(), Some(600), None).dimensions(), (600, 300));
        assert_eq!(apply(img, None, Some(75)).dimensions(), (150, 75));
    }

    #[test]
    fn test_resize_without_targets_is_identity() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(123, 45));
        assert_eq!(apply(img, None, None).dimensions(), (123, 45));
    }
}
