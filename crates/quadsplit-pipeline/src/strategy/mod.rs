//! Splitting strategies: interchangeable algorithms that turn a composite
//! into four panels.
//!
//! This module defines the [`SplitStrategy`] trait implemented by every
//! algorithm, the [`StrategyKind`] enum naming them, and the [`Strategy`]
//! enum holding a configured instance of any of them.
//!
//! # Static registry
//!
//! The set of strategies is closed. Configuration names a strategy by its
//! [`StrategyKind::as_str`] string; [`StrategyKind::from_str`] resolves it
//! and [`Strategy::from_config`] builds the configured instance. Names
//! that do not parse are reported as [`UnknownStrategy`].

mod contour_analysis;
mod midpoint;
mod projection_profile;
mod single_axis;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::types::{Axis, Rect, RgbImage, SplitResult};

pub use contour_analysis::{ContourAnalysis, assign_quadrants, grid_confidence};
pub use midpoint::MidpointFallback;
pub use projection_profile::ProjectionProfile;
pub use single_axis::SingleAxisSplit;

/// Names every available splitting algorithm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Four equal quadrants at the pixel midpoints.
    MidpointFallback,
    /// Two flattest-line seeds refined by band scanning.
    ProjectionProfile,
    /// A single horizontal divider; the vertical split is the midpoint.
    HorizontalProjectionSplit,
    /// A single vertical divider; the horizontal split is the midpoint.
    VerticalProjectionSplit,
    /// Adaptive thresholding and external contours for seamless layouts.
    ContourAnalysis,
}

impl StrategyKind {
    /// Every strategy, in registry order.
    pub const ALL: [Self; 5] = [
        Self::MidpointFallback,
        Self::ProjectionProfile,
        Self::HorizontalProjectionSplit,
        Self::VerticalProjectionSplit,
        Self::ContourAnalysis,
    ];

    /// Canonical configuration and logging name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MidpointFallback => "midpoint_fallback",
            Self::ProjectionProfile => "projection_profile",
            Self::HorizontalProjectionSplit => "horizontal_projection_split",
            Self::VerticalProjectionSplit => "vertical_projection_split",
            Self::ContourAnalysis => "contour_analysis",
        }
    }

    /// Whether results from this strategy are re-centred by the standardizer.
    ///
    /// Projection-based crops are already axis-aligned and trimmed; only
    /// contour crops are re-centred on uniform canvases.
    #[must_use]
    pub const fn recenters(self) -> bool {
        matches!(self, Self::ContourAnalysis)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured strategy name that matches no known strategy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy name: {0:?}")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownStrategy(s.to_owned()))
    }
}

/// Trait for splitting strategies.
///
/// Input: the composite image and its file name. The file name only keys
/// debug output and never influences the split.
/// Output: a [`SplitResult`] carrying panels or a typed failure.
pub trait SplitStrategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Split `image` into four panels.
    fn split(&self, image: &RgbImage, filename: &str) -> SplitResult;
}

/// A configured instance of any strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// See [`MidpointFallback`].
    MidpointFallback(MidpointFallback),
    /// See [`ProjectionProfile`].
    ProjectionProfile(ProjectionProfile),
    /// See [`SingleAxisSplit`]; the axis picks horizontal or vertical.
    SingleAxis(SingleAxisSplit),
    /// See [`ContourAnalysis`].
    ContourAnalysis(ContourAnalysis),
}

impl Strategy {
    /// Build `kind` over the shared `config`.
    #[must_use]
    pub fn from_config(kind: StrategyKind, config: &Arc<Config>) -> Self {
        match kind {
            StrategyKind::MidpointFallback => Self::MidpointFallback(MidpointFallback),
            StrategyKind::ProjectionProfile => {
                Self::ProjectionProfile(ProjectionProfile::new(Arc::clone(config)))
            }
            StrategyKind::HorizontalProjectionSplit => {
                Self::SingleAxis(SingleAxisSplit::new(Axis::Horizontal, Arc::clone(config)))
            }
            StrategyKind::VerticalProjectionSplit => {
                Self::SingleAxis(SingleAxisSplit::new(Axis::Vertical, Arc::clone(config)))
            }
            StrategyKind::ContourAnalysis => {
                Self::ContourAnalysis(ContourAnalysis::new(Arc::clone(config)))
            }
        }
    }
}

impl SplitStrategy for Strategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Self::MidpointFallback(s) => s.kind(),
            Self::ProjectionProfile(s) => s.kind(),
            Self::SingleAxis(s) => s.kind(),
            Self::ContourAnalysis(s) => s.kind(),
        }
    }

    fn split(&self, image: &RgbImage, filename: &str) -> SplitResult {
        match self {
            Self::MidpointFallback(s) => s.split(image, filename),
            Self::ProjectionProfile(s) => s.split(image, filename),
            Self::SingleAxis(s) => s.split(image, filename),
            Self::ContourAnalysis(s) => s.split(image, filename),
        }
    }
}

/// Copy the region `r` out of `image`.
fn crop(image: &RgbImage, r: Rect) -> RgbImage {
    imageops::crop_imm(image, r.x, r.y, r.width, r.height).to_image()
}

/// The four panel rectangles around a divider cross.
///
/// Columns `[x_start, x_end)` and rows `[y_start, y_end)` are excluded;
/// a zero-width divider on an axis is a plain cut.
const fn grid_cells(
    width: u32,
    height: u32,
    (x_start, x_end): (u32, u32),
    (y_start, y_end): (u32, u32),
) -> [Rect; 4] {
    [
        Rect::new(0, 0, x_start, y_start),
        Rect::new(x_end, 0, width - x_end, y_start),
        Rect::new(0, y_end, x_start, height - y_end),
        Rect::new(x_end, y_end, width - x_end, height - y_end),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "hough_lines".parse::<StrategyKind>(),
            Err(UnknownStrategy("hough_lines".to_owned()))
        );
    }

    #[test]
    fn only_contour_analysis_recenters() {
        let recentering: Vec<_> = StrategyKind::ALL
            .into_iter()
            .filter(|k| k.recenters())
            .collect();
        assert_eq!(recentering, [StrategyKind::ContourAnalysis]);
    }

    #[test]
    fn from_config_builds_matching_kind() {
        let config = Arc::new(Config::default());
        for kind in StrategyKind::ALL {
            assert_eq!(Strategy::from_config(kind, &config).kind(), kind);
        }
    }

    #[test]
    fn configured_strategies_share_one_config() {
        let config = Arc::new(Config::default());
        let strategies: Vec<_> = StrategyKind::ALL
            .into_iter()
            .map(|kind| Strategy::from_config(kind, &config))
            .collect();
        // One handle here, one per strategy except the parameterless midpoint.
        assert_eq!(Arc::strong_count(&config), strategies.len());
        drop(strategies);
        assert_eq!(Arc::strong_count(&config), 1);
    }

    #[test]
    fn grid_cells_exclude_divider() {
        let cells = grid_cells(100, 80, (45, 55), (38, 42));
        assert_eq!(cells[0], Rect::new(0, 0, 45, 38));
        assert_eq!(cells[1], Rect::new(55, 0, 45, 38));
        assert_eq!(cells[2], Rect::new(0, 42, 45, 38));
        assert_eq!(cells[3], Rect::new(55, 42, 45, 38));
    }

    #[test]
    fn crop_copies_region() {
        let img = RgbImage::from_fn(10, 10, |x, y| image::Rgb([u8::try_from(x * 10 + y).unwrap_or(0), 0, 0]));
        let cell = crop(&img, Rect::new(3, 4, 2, 2));
        assert_eq!(cell.dimensions(), (2, 2));
        assert_eq!(cell.get_pixel(1, 1).0[0], 45);
    }
}
