use std::sync::Arc;

use image::imageops;
use tracing::debug;

use super::{SplitStrategy, StrategyKind, crop, grid_cells};
use crate::bands::find_precise_bounds;
use crate::config::{Config, SingleAxisConfig};
use crate::stats::{Extremum, extremum_run_center, mean_std, projection};
use crate::types::{
    Axis, DebugArtifact, DebugArtifacts, Panels, Rect, RgbImage, SplitError, SplitResult,
};

/// Splits a composite that has a divider on one axis only.
///
/// The divider is found on the projected intensity sums within the
/// configured search band: whichever of the band's minimum or maximum
/// sits further from the band mean is taken as the divider line, then
/// band scanning measures its thickness. The other axis is cut at its
/// exact midpoint.
#[derive(Debug, Clone)]
pub struct SingleAxisSplit {
    axis: Axis,
    config: Arc<Config>,
}

impl SingleAxisSplit {
    /// Confidence reported whenever a divider is found.
    pub const CONFIDENCE: f64 = 0.9;

    /// Create the strategy for a divider along `axis`.
    ///
    /// A horizontal divider reads `horizontal_projection_split`, a
    /// vertical one `vertical_projection_split`.
    #[must_use]
    pub const fn new(axis: Axis, config: Arc<Config>) -> Self {
        Self { axis, config }
    }

    fn section(&self) -> &SingleAxisConfig {
        match self.axis {
            Axis::Horizontal => &self.config.horizontal_projection_split,
            Axis::Vertical => &self.config.vertical_projection_split,
        }
    }

    /// Coarse divider line from the projection profile.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn coarse_line(&self, image: &image::GrayImage) -> Result<u32, SplitError> {
        let axis = self.axis;
        let sums = projection(image, axis);
        let len = sums.len() as f64;
        let start = (len * self.section().search_start) as usize;
        let end = ((len * self.section().search_end) as usize).min(sums.len());
        if start >= end {
            return Err(SplitError::EmptySearchBand { axis });
        }

        let band: Vec<f64> = sums[start..end].iter().map(|&s| s as f64).collect();
        let (mean, _) = mean_std(band.iter().copied()).ok_or(SplitError::EmptySearchBand { axis })?;
        let min = band.iter().copied().fold(f64::INFINITY, f64::min);
        let max = band.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let which = if mean - min > max - mean {
            Extremum::Min
        } else {
            Extremum::Max
        };
        let offset =
            extremum_run_center(&band, which).ok_or(SplitError::NoDividerCandidate { axis })?;
        u32::try_from(start + offset).map_err(|_| SplitError::NoDividerCandidate { axis })
    }

    fn try_split(
        &self,
        image: &RgbImage,
        artifacts: &mut DebugArtifacts,
    ) -> Result<Panels, SplitError> {
        let axis = self.axis;
        let (width, height) = image.dimensions();
        if width < 2 || height < 2 {
            return Err(SplitError::EmptyImage { width, height });
        }
        let gray = imageops::grayscale(image);
        let line = self.coarse_line(&gray)?;
        artifacts.insert(
            "seed_line".to_owned(),
            DebugArtifact::SeedLine {
                axis,
                position: line,
            },
        );

        // Probe a quarter of the way along the divider, clear of the centre.
        let (cx, cy) = match axis {
            Axis::Horizontal => (width / 4, line),
            Axis::Vertical => (line, height / 4),
        };
        let divider = find_precise_bounds(&gray, cx, cy, &self.section().band_scan)
            .ok_or(SplitError::DividerBoundsNotFound { axis })?;
        artifacts.insert("divider".to_owned(), DebugArtifact::Divider(divider));
        debug!(%axis, ?divider, "single divider extent");

        let (mid_x, mid_y) = (width / 2, height / 2);
        let cells = match axis {
            Axis::Horizontal => grid_cells(
                width,
                height,
                (mid_x, mid_x),
                (divider.y_start, divider.y_end),
            ),
            Axis::Vertical => grid_cells(
                width,
                height,
                (divider.x_start, divider.x_end),
                (mid_y, mid_y),
            ),
        };
        if cells.iter().any(Rect::is_degenerate) {
            return Err(SplitError::DividerBoundsNotFound { axis });
        }

        Ok(Panels {
            images: cells.map(|cell| crop(image, cell)),
            bounds: Some([Rect::ZERO; 4]),
        })
    }
}

impl SplitStrategy for SingleAxisSplit {
    fn kind(&self) -> StrategyKind {
        match self.axis {
            Axis::Horizontal => StrategyKind::HorizontalProjectionSplit,
            Axis::Vertical => StrategyKind::VerticalProjectionSplit,
        }
    }

    fn split(&self, image: &RgbImage, filename: &str) -> SplitResult {
        let name = self.kind().as_str();
        let mut artifacts = DebugArtifacts::new();
        let result = match self.try_split(image, &mut artifacts) {
            Ok(panels) => {
                debug!(filename, strategy = name, "single-axis split");
                SplitResult::success(name, Self::CONFIDENCE, panels)
            }
            Err(error) => SplitResult::failure(name, error),
        };
        result.with_artifacts(artifacts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    fn horizontal() -> SingleAxisSplit {
        SingleAxisSplit::new(Axis::Horizontal, Arc::default())
    }

    fn vertical() -> SingleAxisSplit {
        SingleAxisSplit::new(Axis::Vertical, Arc::default())
    }

    /// Dark content with a bright band across rows `[lo, hi)`.
    fn row_band(w: u32, h: u32, lo: u32, hi: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if (lo..hi).contains(&y) {
                Rgb([250, 250, 250])
            } else {
                let v = u8::try_from((x * 7 + y * 3) % 60).unwrap() + 30;
                Rgb([v, v, v])
            }
        })
    }

    #[test]
    fn bright_horizontal_divider() {
        let result = horizontal().split(&row_band(200, 300, 140, 160), "h.png");
        assert!(result.is_success(), "{:?}", result.error());
        assert_eq!(result.strategy_used, "horizontal_projection_split");
        assert!((result.confidence - 0.9).abs() < f64::EPSILON);
        let dims: Vec<_> = result.images().unwrap().iter().map(RgbImage::dimensions).collect();
        assert_eq!(dims, [(100, 140), (100, 140), (100, 140), (100, 140)]);
        assert_eq!(result.bounds(), Some(&[Rect::ZERO; 4]));
    }

    #[test]
    fn dark_vertical_divider() {
        let image = RgbImage::from_fn(300, 200, |x, y| {
            if (145..155).contains(&x) {
                Rgb([0, 0, 0])
            } else {
                let v = u8::try_from((x * 5 + y * 11) % 80).unwrap() + 120;
                Rgb([v, v, v])
            }
        });
        let result = vertical().split(&image, "v.png");
        assert!(result.is_success(), "{:?}", result.error());
        let dims: Vec<_> = result.images().unwrap().iter().map(RgbImage::dimensions).collect();
        assert_eq!(dims, [(145, 100), (145, 100), (145, 100), (145, 100)]);
    }

    #[test]
    fn empty_search_band_fails() {
        let mut config = Config::default();
        config.horizontal_projection_split.search_start = 0.5;
        config.horizontal_projection_split.search_end = 0.501;
        let split = SingleAxisSplit::new(Axis::Horizontal, Arc::new(config));
        let result = split.split(&row_band(50, 50, 20, 30), "narrow.png");
        assert_eq!(
            result.error(),
            Some(&SplitError::EmptySearchBand {
                axis: Axis::Horizontal
            })
        );
    }

    #[test]
    fn tiny_image_fails() {
        let result = vertical().split(&RgbImage::new(1, 5), "tiny.png");
        assert!(matches!(result.error(), Some(SplitError::EmptyImage { .. })));
    }
}
