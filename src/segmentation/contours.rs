use super::BoundingBox;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Outer boundary of one top-level ink component
#[derive(Debug, Clone)]
pub struct ExternalContour {
    /// Boundary pixels in tracing order
    pub points: Vec<Point<u32>>,
    pub bbox: BoundingBox,
    /// Area enclosed by the boundary polygon
    pub area: f64,
}

/// Trace the outer borders of all components not nested inside another
///
/// Holes and components sitting inside holes are skipped.
pub fn external_contours(mask: &GrayImage) -> Vec<ExternalContour> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let bbox = bounding_rect(&c.points)?;
            let area = polygon_area(&c.points);
            Some(ExternalContour {
                points: c.points,
                bbox,
                area,
            })
        })
        .collect()
}

/// Smallest box containing every point, inclusive of edge pixels
pub fn bounding_rect(points: &[Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Shoelace area of a closed polygon through pixel centers
pub fn polygon_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}
