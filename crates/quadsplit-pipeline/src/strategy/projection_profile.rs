use std::sync::Arc;

use image::{GrayImage, imageops};
use tracing::debug;

use super::{SplitStrategy, StrategyKind, crop, grid_cells};
use crate::bands::find_precise_bounds;
use crate::config::{Config, ProjectionProfileConfig};
use crate::content::find_content_bounds;
use crate::stats::{Extremum, extremum_run_center, line_std, line_stds};
use crate::types::{
    Axis, DebugArtifact, DebugArtifacts, Panels, Rect, RgbImage, SplitError, SplitResult,
};

/// Locates both dividers of a fully divided composite.
///
/// Within the central `search_zone_ratio` of each axis, the flattest line
/// (lowest intensity standard deviation) seeds the divider. Each seed is
/// refined by band scanning at a point away from the other divider, so
/// the walk measures the divider's thickness instead of running along the
/// crossing divider. Panels are the four rectangles outside both divider
/// extents, each with its own content bounds.
#[derive(Debug, Clone, Default)]
pub struct ProjectionProfile {
    config: Arc<Config>,
}

impl ProjectionProfile {
    /// Create the strategy; it reads the `projection_profile` and
    /// `content_bounds` sections.
    #[must_use]
    pub const fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn section(&self) -> &ProjectionProfileConfig {
        &self.config.projection_profile
    }

    /// Index of the flattest line within the central search zone of `axis`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn flattest_line(&self, gray: &GrayImage, axis: Axis) -> Result<u32, SplitError> {
        let len = match axis {
            Axis::Horizontal => gray.height(),
            Axis::Vertical => gray.width(),
        };
        let zone = ((f64::from(len) * self.section().search_zone_ratio).round() as u32).min(len);
        if zone == 0 {
            return Err(SplitError::EmptySearchBand { axis });
        }
        let start = (len - zone) / 2;
        let stds = line_stds(gray, axis, start..start + zone);
        let offset = extremum_run_center(&stds, Extremum::Min)
            .ok_or(SplitError::NoDividerCandidate { axis })?;
        u32::try_from(offset)
            .map(|o| start + o)
            .map_err(|_| SplitError::NoDividerCandidate { axis })
    }

    /// Linear noise score of one seed line: 1 when flat, 0 at the ceiling.
    fn line_score(&self, gray: &GrayImage, axis: Axis, index: u32) -> f64 {
        line_std(gray, axis, index).map_or(0.0, |std| {
            (1.0 - std / self.section().consistency_threshold).max(0.0)
        })
    }

    fn try_split(
        &self,
        image: &RgbImage,
        artifacts: &mut DebugArtifacts,
    ) -> Result<(f64, Panels), SplitError> {
        let (width, height) = image.dimensions();
        if width < 2 || height < 2 {
            return Err(SplitError::EmptyImage { width, height });
        }
        let gray = imageops::grayscale(image);

        let seed_row = self.flattest_line(&gray, Axis::Horizontal)?;
        let seed_col = self.flattest_line(&gray, Axis::Vertical)?;
        artifacts.insert(
            "seed_row".to_owned(),
            DebugArtifact::SeedLine {
                axis: Axis::Horizontal,
                position: seed_row,
            },
        );
        artifacts.insert(
            "seed_col".to_owned(),
            DebugArtifact::SeedLine {
                axis: Axis::Vertical,
                position: seed_col,
            },
        );

        // The vertical divider is probed halfway up the top panels, the
        // horizontal one halfway across the left panels.
        let vertical = find_precise_bounds(&gray, seed_col, seed_row / 2, &self.section().band_scan)
            .ok_or(SplitError::DividerBoundsNotFound {
                axis: Axis::Vertical,
            })?;
        let horizontal =
            find_precise_bounds(&gray, seed_col / 2, seed_row, &self.section().band_scan).ok_or(
                SplitError::DividerBoundsNotFound {
                    axis: Axis::Horizontal,
                },
            )?;
        artifacts.insert("vertical_divider".to_owned(), DebugArtifact::Divider(vertical));
        artifacts.insert(
            "horizontal_divider".to_owned(),
            DebugArtifact::Divider(horizontal),
        );
        debug!(?vertical, ?horizontal, "divider extents");

        let max_fraction = self.section().max_divider_fraction;
        if f64::from(vertical.width()) > max_fraction * f64::from(width)
            || f64::from(horizontal.height()) > max_fraction * f64::from(height)
        {
            return Err(SplitError::DividerTooLarge {
                vertical: vertical.width(),
                horizontal: horizontal.height(),
            });
        }

        let confidence = f64::midpoint(
            self.line_score(&gray, Axis::Horizontal, seed_row),
            self.line_score(&gray, Axis::Vertical, seed_col),
        );
        artifacts.insert("confidence".to_owned(), DebugArtifact::Scalar(confidence));
        if confidence < self.section().confidence_threshold {
            return Err(SplitError::LowConfidence {
                confidence,
                threshold: self.section().confidence_threshold,
            });
        }

        let cells = grid_cells(
            width,
            height,
            (vertical.x_start, vertical.x_end),
            (horizontal.y_start, horizontal.y_end),
        );
        if cells[0].width == 0 || cells[1].width == 0 {
            return Err(SplitError::DividerBoundsNotFound {
                axis: Axis::Vertical,
            });
        }
        if cells[0].height == 0 || cells[2].height == 0 {
            return Err(SplitError::DividerBoundsNotFound {
                axis: Axis::Horizontal,
            });
        }

        let images = cells.map(|cell| crop(image, cell));
        let bounds = std::array::from_fn(|i| {
            find_content_bounds(&images[i], &self.config.content_bounds).unwrap_or(Rect::ZERO)
        });
        Ok((
            confidence,
            Panels {
                images,
                bounds: Some(bounds),
            },
        ))
    }
}

impl SplitStrategy for ProjectionProfile {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProjectionProfile
    }

    fn split(&self, image: &RgbImage, filename: &str) -> SplitResult {
        let name = self.kind().as_str();
        let mut artifacts = DebugArtifacts::new();
        let result = match self.try_split(image, &mut artifacts) {
            Ok((confidence, panels)) => {
                debug!(filename, confidence, "projection profile split");
                SplitResult::success(name, confidence, panels)
            }
            Err(error) => SplitResult::failure(name, error),
        };
        result.with_artifacts(artifacts)
    }
}
