use crate::error::PipelineError;
use image::{GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use std::str::FromStr;

/// CLAHE tile grid (tiles per axis)
const CLAHE_TILES: u32 = 8;
const CLAHE_CLIP_LIMIT: f32 = 2.0;
pub const DEFAULT_GAMMA: f32 = 1.2;

/// Contrast enhancement strategies
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ContrastMethod {
    /// Contrast-limited adaptive histogram equalization (8x8 tiles, clip 2.0)
    #[default]
    Clahe,
    /// Global histogram equalization
    HistogramEq,
    /// Power-law lookup table, `out = round((in / 255)^gamma * 255)`
    Gamma { gamma: f32 },
}

impl ContrastMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clahe => "clahe",
            Self::HistogramEq => "histogram_eq",
            Self::Gamma { .. } => "gamma",
        }
    }
}

impl FromStr for ContrastMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clahe" => Ok(Self::Clahe),
            "histogram_eq" | "histogram-eq" => Ok(Self::HistogramEq),
            "gamma" => Ok(Self::Gamma {
                gamma: DEFAULT_GAMMA,
            }),
            other => Err(PipelineError::Config(format!(
                "unknown contrast method '{}' (expected clahe, histogram_eq or gamma)",
                other
            ))),
        }
    }
}

/// Enhance contrast with the selected strategy
pub fn apply(image: &GrayImage, method: ContrastMethod) -> GrayImage {
    match method {
        ContrastMethod::Clahe => clahe(image, CLAHE_TILES, CLAHE_CLIP_LIMIT),
        ContrastMethod::HistogramEq => equalize_histogram(image),
        ContrastMethod::Gamma { gamma } => apply_lut(image, &gamma_lut(gamma)),
    }
}

/// 256-entry power-law lookup table
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let v = (i as f64 / 255.0).powf(gamma as f64) * 255.0;
        *entry = v.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

fn apply_lut(image: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}

/// Contrast-limited adaptive histogram equalization
///
/// The image is split into `tiles` x `tiles` tiles. Each tile gets its own
/// clipped, equalized lookup table, and every pixel is mapped through a
/// bilinear blend of the four nearest tile tables. Images that do not divide
/// evenly are mirrored at the right and bottom edges while building tables.
pub fn clahe(image: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let tiles = tiles.max(1);
    let tile_w = width.div_ceil(tiles).max(1);
    let tile_h = height.div_ceil(tiles).max(1);
    let tile_area = (tile_w * tile_h) as f32;

    let clip = if clip_limit > 0.0 {
        ((clip_limit * tile_area / 256.0) as u32).max(1)
    } else {
        u32::MAX
    };
    let lut_scale = 255.0 / tile_area;

    let mut luts = vec![[0u8; 256]; (tiles * tiles) as usize];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0u32; 256];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let sy = mirror(y, height);
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let sx = mirror(x, width);
                    hist[image.get_pixel(sx, sy).0[0] as usize] += 1;
                }
            }
            clip_histogram(&mut hist, clip);

            let lut = &mut luts[(ty * tiles + tx) as usize];
            let mut sum = 0u32;
            for (i, count) in hist.iter().enumerate() {
                sum += count;
                lut[i] = (sum as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let last = tiles as i32 - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let v = image.get_pixel(x, y).0[0] as usize;

        let tyf = y as f32 * inv_th - 0.5;
        let ty1 = tyf.floor() as i32;
        let ya = tyf - ty1 as f32;
        let (ty1, ty2) = (ty1.clamp(0, last) as u32, (ty1 + 1).clamp(0, last) as u32);

        let txf = x as f32 * inv_tw - 0.5;
        let tx1 = txf.floor() as i32;
        let xa = txf - tx1 as f32;
        let (tx1, tx2) = (tx1.clamp(0, last) as u32, (tx1 + 1).clamp(0, last) as u32);

        let at = |tx: u32, ty: u32| luts[(ty * tiles + tx) as usize][v] as f32;
        let top = at(tx1, ty1) * (1.0 - xa) + at(tx2, ty1) * xa;
        let bottom = at(tx1, ty2) * (1.0 - xa) + at(tx2, ty2) * xa;
        let blended = top * (1.0 - ya) + bottom * ya;
        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Clip bins at `limit` and spread the excess evenly over all bins
fn clip_histogram(hist: &mut [u32; 256], limit: u32) {
    let mut clipped = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            clipped += *count - limit;
            *count = limit;
        }
    }

    let batch = clipped / 256;
    let mut residual = clipped - batch * 256;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        for count in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *count += 1;
            residual -= 1;
        }
    }
}

/// Mirror an out-of-range coordinate back inside `[0, len)`
fn mirror(i: u32, len: u32) -> u32 {
    if i < len {
        i
    } else if len <= 1 {
        0
    } else {
        (2 * (len - 1)).saturating_sub(i).min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_uniform_128() {
        let img = GrayImage::from_pixel(60, 60, Luma([128]));
        let result = apply(&img, ContrastMethod::Gamma { gamma: 1.2 });

        let expected = ((128.0f64 / 255.0).powf(1.2) * 255.0).round() as u8;
        assert!(result.pixels().all(|p| p.0[0] == expected));
    }

    #[test]
    fn test_gamma_lut_endpoints() {
        let lut = gamma_lut(DEFAULT_GAMMA);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        assert!(lut[128] < 128, "gamma > 1 darkens midtones");
    }

    #[test]
    fn test_histogram_eq_stretches_low_contrast() {
        let img = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x as u8 % 20)]));
        let result = apply(&img, ContrastMethod::HistogramEq);

        let max = result.pixels().map(|p| p.0[0]).max().unwrap();
        let min = result.pixels().map(|p| p.0[0]).min().unwrap();
        assert!(max - min > 19);
    }

    #[test]
    fn test_clahe_preserves_dimensions_and_uniform_image() {
        let img = GrayImage::from_pixel(101, 67, Luma([90]));
        let result = apply(&img, ContrastMethod::Clahe);

        assert_eq!(result.dimensions(), (101, 67));
        let first = result.get_pixel(0, 0).0[0];
        assert!(result.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn test_clahe_keeps_faint_strokes_separated() {
        // Faint strokes (120) on light paper (140)
        let img = GrayImage::from_fn(128, 128, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Luma([120])
            } else {
                Luma([140])
            }
        });

        let result = apply(&img, ContrastMethod::Clahe);
        let dark = result.get_pixel(0, 0).0[0] as i32;
        let light = result.get_pixel(4, 0).0[0] as i32;
        assert!(light - dark >= 20, "strokes flattened: {} vs {}", dark, light);
    }

    #[test]
    fn test_clip_histogram_conserves_mass() {
        let mut hist = [0u32; 256];
        hist[10] = 1000;
        hist[200] = 24;
        clip_histogram(&mut hist, 40);
        assert_eq!(hist.iter().sum::<u32>(), 1024);
        assert!(hist[10] <= 40 + 4);
    }

    #[test]
    fn test_parse_gamma_uses_default() {
        assert_eq!(
            "gamma".parse::<ContrastMethod>().unwrap(),
            ContrastMethod::Gamma { gamma: 1.2 }
        );
        assert!("sharpen".parse::<ContrastMethod>().is_err());
    }
}
