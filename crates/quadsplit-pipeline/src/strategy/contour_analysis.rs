use std::sync::Arc;

use image::imageops;
use tracing::debug;

use super::{SplitStrategy, StrategyKind, crop};
use crate::config::Config;
use crate::contour::{Blob, external_blobs};
use crate::stats::mean_std;
use crate::threshold::{adaptive_threshold, merge_blobs};
use crate::types::{
    DebugArtifact, DebugArtifacts, Panels, Point, Rect, RgbImage, SplitError, SplitResult,
};

/// Number of panels in the grid.
const PANELS: usize = 4;

/// Splits seamless composites by finding one content blob per panel.
///
/// Adaptive thresholding picks out content boundaries regardless of the
/// background colour, a close/open pass fuses each panel into a single
/// blob, and the four largest external contours above the minimum area
/// become the panels. Boxes are assigned to quadrants by corner distance,
/// which tolerates unequal panel sizes and imperfect alignment.
#[derive(Debug, Clone, Default)]
pub struct ContourAnalysis {
    config: Arc<Config>,
}

impl ContourAnalysis {
    /// Create the strategy; it reads the `contour_analysis` section.
    #[must_use]
    pub const fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    #[allow(clippy::cast_precision_loss)]
    fn try_split(
        &self,
        image: &RgbImage,
        artifacts: &mut DebugArtifacts,
    ) -> Result<(f64, Panels), SplitError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SplitError::EmptyImage { width, height });
        }
        let c = &self.config.contour_analysis;

        let gray = imageops::grayscale(image);
        let binary = adaptive_threshold(&gray, c.adaptive_block_radius, c.adaptive_offset);
        let mask = merge_blobs(&binary, c.close_radius, c.open_radius);

        let min_area = c.min_area_ratio * (f64::from(width) * f64::from(height));
        let mut blobs: Vec<Blob> = external_blobs(&mask)
            .into_iter()
            .filter(|b| b.area > min_area)
            .collect();
        artifacts.insert(
            "candidates".to_owned(),
            DebugArtifact::Boxes(blobs.iter().map(|b| b.bounds).collect()),
        );
        debug!(candidates = blobs.len(), min_area, "contour candidates");
        if blobs.len() < PANELS {
            return Err(SplitError::TooFewContours {
                found: blobs.len(),
                required: PANELS,
            });
        }

        blobs.sort_by(|a, b| b.area.total_cmp(&a.area));
        let largest = [
            blobs[0].bounds,
            blobs[1].bounds,
            blobs[2].bounds,
            blobs[3].bounds,
        ];
        let boxes = assign_quadrants(largest, width, height);
        artifacts.insert("selected".to_owned(), DebugArtifact::Boxes(boxes.to_vec()));

        let confidence = grid_confidence(&boxes, c.grid_alignment_tolerance_px);
        artifacts.insert("confidence".to_owned(), DebugArtifact::Scalar(confidence));

        Ok((
            confidence,
            Panels {
                images: boxes.map(|b| crop(image, b)),
                bounds: Some(boxes.map(|b| Rect::new(0, 0, b.width, b.height))),
            },
        ))
    }
}

impl SplitStrategy for ContourAnalysis {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ContourAnalysis
    }

    fn split(&self, image: &RgbImage, filename: &str) -> SplitResult {
        let name = self.kind().as_str();
        let mut artifacts = DebugArtifacts::new();
        let result = match self.try_split(image, &mut artifacts) {
            Ok((confidence, panels)) => {
                debug!(filename, confidence, "contour analysis split");
                SplitResult::success(name, confidence, panels)
            }
            Err(error) => SplitResult::failure(name, error),
        };
        result.with_artifacts(artifacts)
    }
}

/// Order four boxes top-left, top-right, bottom-left, bottom-right.
///
/// Of all 24 assignments of boxes to image corners, picks the one with
/// the smallest total distance from each box centre to its corner. This
/// is the corner-nearest rule without the risk of two corners claiming
/// the same box.
#[must_use]
pub fn assign_quadrants(boxes: [Rect; 4], width: u32, height: u32) -> [Rect; 4] {
    let (w, h) = (f64::from(width), f64::from(height));
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(0.0, h),
        Point::new(w, h),
    ];
    let centers = boxes.map(|b| b.center());

    let mut best = ([0, 1, 2, 3], f64::INFINITY);
    for a in 0..4 {
        for b in (0..4).filter(|&b| b != a) {
            for c in (0..4).filter(|&c| c != a && c != b) {
                let d = 6 - a - b - c;
                let order = [a, b, c, d];
                let cost: f64 = order
                    .iter()
                    .zip(corners)
                    .map(|(&i, corner)| centers[i].distance(corner))
                    .sum();
                if cost < best.1 {
                    best = (order, cost);
                }
            }
        }
    }
    best.0.map(|i| boxes[i])
}

/// Plausibility of four ordered boxes as a 2x2 grid, in `[0, 1]`.
///
/// Half the score rewards similar areas (`1 - coefficient of variation`,
/// floored at 0); the other half is the fraction of the four row/column
/// alignments (top pair and bottom pair by centre y, left pair and right
/// pair by centre x) that fall within `tolerance` pixels.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grid_confidence(boxes: &[Rect; 4], tolerance: f64) -> f64 {
    let Some((mean, std)) = mean_std(boxes.iter().map(|b| b.area() as f64)) else {
        return 0.0;
    };
    if mean <= 0.0 {
        return 0.0;
    }
    let area_score = (1.0 - std / mean).max(0.0);

    let [tl, tr, bl, br] = boxes.map(|b| b.center());
    let aligned = [
        (tl.y - tr.y).abs(),
        (bl.y - br.y).abs(),
        (tl.x - bl.x).abs(),
        (tr.x - br.x).abs(),
    ]
    .into_iter()
    .filter(|&d| d < tolerance)
    .count();
    let grid_score = aligned as f64 / 4.0;

    0.5f64.mul_add(area_score, 0.5 * grid_score)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Four staggered, unequal panels on white.
    fn staggered() -> (RgbImage, [Rect; 4]) {
        let boxes = [
            Rect::new(50, 50, 470, 390),
            Rect::new(560, 50, 390, 470),
            Rect::new(50, 480, 420, 470),
            Rect::new(500, 560, 450, 390),
        ];
        let colors = [
            Rgb([200, 30, 30]),
            Rgb([30, 160, 30]),
            Rgb([30, 30, 200]),
            Rgb([160, 140, 20]),
        ];
        let image = RgbImage::from_fn(1000, 1000, |x, y| {
            boxes
                .iter()
                .zip(colors)
                .find(|(b, _)| x >= b.x && x < b.right() && y >= b.y && y < b.bottom())
                .map_or(Rgb([255, 255, 255]), |(_, c)| c)
        });
        (image, boxes)
    }

    #[test]
    fn finds_staggered_panels() {
        let (image, boxes) = staggered();
        let result = ContourAnalysis::default().split(&image, "seamless.png");
        assert!(result.is_success(), "{:?}", result.error());
        assert_eq!(
            result.debug_artifacts.get("selected"),
            Some(&DebugArtifact::Boxes(boxes.to_vec()))
        );
        let dims: Vec<_> = result.images().unwrap().iter().map(RgbImage::dimensions).collect();
        assert_eq!(dims, boxes.map(|b| (b.width, b.height)));
        assert_eq!(
            result.bounds().unwrap()[3],
            Rect::new(0, 0, boxes[3].width, boxes[3].height)
        );
        assert!(result.confidence > 0.95, "confidence {}", result.confidence);
    }

    #[test]
    fn too_few_blobs_fails() {
        let image = RgbImage::from_fn(200, 200, |x, y| {
            if (20..90).contains(&x) && (20..90).contains(&y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let result = ContourAnalysis::default().split(&image, "one.png");
        assert_eq!(
            result.error(),
            Some(&SplitError::TooFewContours {
                found: 1,
                required: 4
            })
        );
    }

    #[test]
    fn blank_image_has_no_contours() {
        let image = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let result = ContourAnalysis::default().split(&image, "blank.png");
        assert!(matches!(
            result.error(),
            Some(SplitError::TooFewContours { found: 0, .. })
        ));
    }

    #[test]
    fn assignment_is_independent_of_input_order() {
        let tl = Rect::new(0, 0, 40, 40);
        let tr = Rect::new(60, 5, 40, 30);
        let bl = Rect::new(5, 60, 30, 40);
        let br = Rect::new(55, 55, 45, 45);
        assert_eq!(assign_quadrants([br, bl, tr, tl], 100, 100), [tl, tr, bl, br]);
        assert_eq!(assign_quadrants([tr, tl, br, bl], 100, 100), [tl, tr, bl, br]);
    }

    #[test]
    fn perfect_grid_scores_one() {
        let boxes = [
            Rect::new(0, 0, 10, 10),
            Rect::new(20, 0, 10, 10),
            Rect::new(0, 20, 10, 10),
            Rect::new(20, 20, 10, 10),
        ];
        assert!((grid_confidence(&boxes, 5.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn misaligned_grid_loses_alignment_half() {
        let boxes = [
            Rect::new(0, 0, 10, 10),
            Rect::new(200, 100, 10, 10),
            Rect::new(100, 300, 10, 10),
            Rect::new(400, 500, 10, 10),
        ];
        assert!((grid_confidence(&boxes, 5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn degenerate_boxes_score_zero() {
        assert!(grid_confidence(&[Rect::ZERO; 4], 50.0).abs() < f64::EPSILON);
    }
}
