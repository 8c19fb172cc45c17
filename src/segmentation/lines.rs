//! Text-line detection from the horizontal ink projection
//!
//! The projection (ink pixels per row) peaks once per handwritten line.
//! Peaks are found with a windowed local-maximum test, thinned to a minimum
//! spacing derived from the estimated line height, and each survivor is
//! expanded into a band that is then tightened to the ink it contains.

use super::{BoundingBox, Segmenter};
use crate::io::validate_mask;
use image::GrayImage;
use serde::Serialize;

/// Tunable constants of the line detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams {
    /// Rows with more ink than this count toward the text block extent
    pub text_row_min_ink: u32,
    /// Lines assumed to span the text block when estimating line height
    pub assumed_line_count: u32,
    /// Padding factor applied to the line height estimate
    pub line_height_padding: f64,
    /// Line height used when no text rows exist
    pub fallback_line_height: f64,
    /// Rows skipped at the top and bottom edge during peak search
    pub edge_margin: usize,
    /// Distance of the rows a peak must strictly exceed
    pub peak_window: usize,
    /// Peak must exceed this fraction of the projection maximum
    pub peak_ratio: f64,
    /// Minimum peak spacing as a fraction of line height
    pub min_spacing_ratio: f64,
    /// Band extent above the peak as a fraction of line height
    pub band_above_ratio: f64,
    /// Band extent below the peak as a fraction of line height
    pub band_below_ratio: f64,
    /// Rows/columns inside a band need more ink than this to bound the line
    pub tight_min_ink: u32,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            text_row_min_ink: 5,
            assumed_line_count: 3,
            line_height_padding: 1.2,
            fallback_line_height: 60.0,
            edge_margin: 10,
            peak_window: 8,
            peak_ratio: 0.6,
            min_spacing_ratio: 0.6,
            band_above_ratio: 0.6,
            band_below_ratio: 0.4,
            tight_min_ink: 3,
        }
    }
}

/// One detected line of handwriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextLine {
    /// Tight box around the line's ink
    pub bbox: BoundingBox,
    pub y_start: u32,
    /// `y_start + height`
    pub y_end: u32,
    pub height: u32,
}

/// Intermediate values of one detection run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineAnalysis {
    /// Ink pixels per row; empty for an invalid mask
    pub projection: Vec<u32>,
    pub line_height: f64,
    /// Rows passing the local-maximum test, in row order
    pub candidate_peaks: Vec<usize>,
    /// Candidates surviving minimum-spacing suppression
    pub peaks: Vec<usize>,
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, Default)]
pub struct LineSegmenter {
    params: LineParams,
}

impl LineSegmenter {
    pub fn new(params: LineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LineParams {
        &self.params
    }

    /// Detect lines, ordered top to bottom
    pub fn find_text_lines(&self, mask: &GrayImage) -> Vec<TextLine> {
        self.analyze(mask).lines
    }

    /// Detect lines and keep the intermediate peak data
    pub fn analyze(&self, mask: &GrayImage) -> LineAnalysis {
        if !validate_mask(mask) {
            return LineAnalysis::default();
        }

        let p = &self.params;
        let projection = horizontal_projection(mask);
        let line_height = estimate_line_height(&projection, p);
        let candidate_peaks = find_peaks(&projection, p);
        let peaks = suppress_close_peaks(&candidate_peaks, line_height * p.min_spacing_ratio);

        let height = mask.height();
        let lines: Vec<TextLine> = peaks
            .iter()
            .enumerate()
            .filter_map(|(i, &peak)| {
                let top = (peak as f64 - line_height * p.band_above_ratio).max(0.0) as u32;
                let bottom = if i + 1 == peaks.len() {
                    height
                } else {
                    ((peak as f64 + line_height * p.band_below_ratio) as u32).min(height)
                };
                tight_line(mask, top, bottom, p.tight_min_ink)
            })
            .collect();

        tracing::debug!(
            line_height,
            candidates = candidate_peaks.len(),
            peaks = peaks.len(),
            lines = lines.len(),
            "Line detection finished"
        );

        LineAnalysis {
            projection,
            line_height,
            candidate_peaks,
            peaks,
            lines,
        }
    }
}

impl Segmenter for LineSegmenter {
    type Output = TextLine;

    fn name(&self) -> &'static str {
        "lines"
    }

    fn segment(&self, mask: &GrayImage) -> Vec<TextLine> {
        self.find_text_lines(mask)
    }
}

fn is_ink(value: u8) -> bool {
    value == 255
}

/// Ink pixel count per row
pub fn horizontal_projection(mask: &GrayImage) -> Vec<u32> {
    mask.rows()
        .map(|row| row.filter(|p| is_ink(p.0[0])).count() as u32)
        .collect()
}

/// Line height guess from the vertical extent of the text block
///
/// The block is assumed to hold `assumed_line_count` lines; the integer
/// per-line extent is padded by `line_height_padding`.
pub fn estimate_line_height(projection: &[u32], params: &LineParams) -> f64 {
    let mut text_rows = projection
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > params.text_row_min_ink)
        .map(|(row, _)| row);

    let Some(first) = text_rows.next() else {
        return params.fallback_line_height;
    };
    let last = text_rows.last().unwrap_or(first);
    let extent = (last - first + 1) as u32;
    (extent / params.assumed_line_count.max(1)) as f64 * params.line_height_padding
}

/// Rows that are windowed local maxima of the projection
///
/// Row `i` qualifies when it exceeds `peak_ratio` of the global maximum, is
/// not below either neighbour, and is strictly above the rows `peak_window`
/// away on both sides. A flat top (a run of equal values) is also accepted
/// at its middle row when it is strictly above the rows `peak_window`
/// beyond each end of the run, so bands thicker than the window still peak.
pub fn find_peaks(projection: &[u32], params: &LineParams) -> Vec<usize> {
    let n = projection.len();
    let margin = params.edge_margin.max(1);
    let window = params.peak_window.max(1);
    if n <= 2 * margin {
        return Vec::new();
    }

    let max = projection.iter().copied().max().unwrap_or(0);
    let threshold = max as f64 * params.peak_ratio;

    let (run_start, run_end) = equal_runs(projection);

    (margin..n - margin)
        .filter(|&i| {
            let v = projection[i];
            if v as f64 <= threshold || v < projection[i - 1] || v < projection[i + 1] {
                return false;
            }
            let windowed =
                i >= window && i + window < n && v > projection[i - window] && v > projection[i + window];
            let (start, end) = (run_start[i], run_end[i]);
            let flat_top = i == (start + end) / 2
                && start >= window
                && end + window < n
                && v > projection[start - window]
                && v > projection[end + window];
            windowed || flat_top
        })
        .collect()
}

/// First and last index of the run of equal values containing each index
fn equal_runs(values: &[u32]) -> (Vec<usize>, Vec<usize>) {
    let n = values.len();
    let mut start = vec![0; n];
    let mut end = vec![0; n];
    for i in 0..n {
        start[i] = if i > 0 && values[i - 1] == values[i] {
            start[i - 1]
        } else {
            i
        };
    }
    for i in (0..n).rev() {
        end[i] = if i + 1 < n && values[i + 1] == values[i] {
            end[i + 1]
        } else {
            i
        };
    }
    (start, end)
}

/// Greedy left-to-right thinning to a minimum spacing
pub fn suppress_close_peaks(candidates: &[usize], min_spacing: f64) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for &peak in candidates {
        match kept.last() {
            Some(&last) if ((peak - last) as f64) < min_spacing => {}
            _ => kept.push(peak),
        }
    }
    kept
}

/// Tighten the band `[top, bottom)` to the rows and columns carrying ink
fn tight_line(mask: &GrayImage, top: u32, bottom: u32, min_ink: u32) -> Option<TextLine> {
    if bottom <= top {
        return None;
    }

    let width = mask.width();
    let mut col_counts = vec![0u32; width as usize];
    let mut first_row = None;
    let mut last_row = None;

    for y in top..bottom {
        let mut row_count = 0u32;
        for x in 0..width {
            if is_ink(mask.get_pixel(x, y).0[0]) {
                row_count += 1;
                col_counts[x as usize] += 1;
            }
        }
        if row_count > min_ink {
            first_row.get_or_insert(y);
            last_row = Some(y);
        }
    }

    let (first_row, last_row) = (first_row?, last_row?);
    let first_col = col_counts.iter().position(|&c| c > min_ink)?;
    let last_col = col_counts.iter().rposition(|&c| c > min_ink)?;

    let height = last_row - first_row + 1;
    Some(TextLine {
        bbox: BoundingBox::new(
            first_col as u32,
            first_row,
            (last_col - first_col + 1) as u32,
            height,
        ),
        y_start: first_row,
        y_end: first_row + height,
        height,
    })
}
