//! External contour extraction from a binary blob mask.
//!
//! Uses Suzuki-Abe border following via `imageproc::contours::find_contours`
//! and keeps only outermost borders: holes and anything nested inside
//! another blob are dropped, so each panel contributes one contour.

use image::GrayImage;
use imageproc::contours::{BorderType, Contour, find_contours};

use crate::types::{Point, Rect};

/// One outermost blob of a binary mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Axis-aligned bounding box of the contour points.
    pub bounds: Rect,
    /// Polygon area enclosed by the contour (shoelace formula).
    pub area: f64,
}

/// Outermost contours of `binary` (nonzero = foreground), in discovery order.
#[must_use]
pub fn external_blobs(binary: &GrayImage) -> Vec<Blob> {
    let contours: Vec<Contour<u32>> = find_contours(binary);
    contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<Point> = c
                .points
                .iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            let bounds = bounding_rect(&c.points)?;
            Some(Blob {
                bounds,
                area: polygon_area(&points),
            })
        })
        .collect()
}

/// Unsigned area of a closed polygon.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
        .sum();
    twice.abs() / 2.0
}

fn bounding_rect(points: &[imageproc::point::Point<u32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    Some(Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}
