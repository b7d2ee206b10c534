//! Shared types for the quadsplit diagnosis-and-splitting pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

/// Re-export `RgbImage` so downstream crates can hold composites and
/// panels without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for the intensity buffers the primitives consume.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An axis-aligned rectangle `(x, y, width, height)` in pixel coordinates.
///
/// Origin is top-left, y grows downward. A zero width or height marks
/// the rectangle as degenerate ("no content found").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The all-zero rectangle used when a strategy performs no content analysis.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Geometric center.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }
}

/// Orientation of a divider line.
///
/// A [`Horizontal`](Self::Horizontal) divider is a band of rows separating
/// the top panels from the bottom panels; a [`Vertical`](Self::Vertical)
/// divider is a band of columns separating left from right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// A row-oriented divider (constant y).
    Horizontal,
    /// A column-oriented divider (constant x).
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// Full rectangular extent of a divider found by band scanning.
///
/// End coordinates are exclusive: one past the last matching pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividerBounds {
    /// First column of the divider.
    pub x_start: u32,
    /// One past the last column of the divider.
    pub x_end: u32,
    /// First row of the divider.
    pub y_start: u32,
    /// One past the last row of the divider.
    pub y_end: u32,
}

impl DividerBounds {
    /// Width of the column span.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x_end - self.x_start
    }

    /// Height of the row span.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y_end - self.y_start
    }
}

/// Structural diagnosis of a composite image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    /// Both a horizontal and a vertical divider band were found.
    DividersFull,
    /// Only a vertical divider band was found.
    DividersVerticalOnly,
    /// Only a horizontal divider band was found.
    DividersHorizontalOnly,
    /// No dividers; the image border is a flat background.
    SeamlessUniform,
    /// No dividers; the image border is textured.
    SeamlessComplex,
    /// The image could not be diagnosed (too small to sample).
    Unknown,
}

impl ImageType {
    /// The strategy tried first for this layout, if any.
    #[must_use]
    pub const fn primary_strategy(self) -> Option<StrategyKind> {
        match self {
            Self::DividersFull => Some(StrategyKind::ProjectionProfile),
            Self::DividersHorizontalOnly => Some(StrategyKind::HorizontalProjectionSplit),
            Self::DividersVerticalOnly => Some(StrategyKind::VerticalProjectionSplit),
            Self::SeamlessUniform | Self::SeamlessComplex => Some(StrategyKind::ContourAnalysis),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DividersFull => "dividers_full",
            Self::DividersVerticalOnly => "dividers_vertical_only",
            Self::DividersHorizontalOnly => "dividers_horizontal_only",
            Self::SeamlessUniform => "seamless_uniform",
            Self::SeamlessComplex => "seamless_complex",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Panel position within the 2x2 grid, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// Index 0.
    TopLeft,
    /// Index 1.
    TopRight,
    /// Index 2.
    BottomLeft,
    /// Index 3.
    BottomRight,
}

impl Quadrant {
    /// All quadrants in panel order.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Output file suffix, e.g. `1_top_left`.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::TopLeft => "1_top_left",
            Self::TopRight => "2_top_right",
            Self::BottomLeft => "3_bottom_left",
            Self::BottomRight => "4_bottom_right",
        }
    }
}

/// The four panels produced by a successful split.
///
/// Both arrays are ordered top-left, top-right, bottom-left, bottom-right
/// and correspond index-for-index.
#[derive(Debug, Clone)]
pub struct Panels {
    /// Cropped panel images.
    pub images: [RgbImage; 4],
    /// Subject bounds relative to each panel, when the strategy can supply them.
    pub bounds: Option<[Rect; 4]>,
}

/// Strategy-internal geometry kept for debug rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugArtifact {
    /// A candidate divider line.
    SeedLine {
        /// Orientation of the line.
        axis: Axis,
        /// Row (horizontal) or column (vertical) index.
        position: u32,
    },
    /// Divider extent found by band scanning.
    Divider(DividerBounds),
    /// A set of boxes in composite coordinates.
    Boxes(Vec<Rect>),
    /// A single diagnostic number.
    Scalar(f64),
}

/// Name-keyed debug artifacts attached to a [`SplitResult`].
pub type DebugArtifacts = BTreeMap<String, DebugArtifact>;

/// Outcome of one strategy invocation (or of the whole fallback chain).
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Canonical strategy name, also the threshold lookup key.
    pub strategy_used: &'static str,
    /// Self-reported quality in `[0, 1]`; only comparable within one strategy.
    pub confidence: f64,
    /// Panels on success, typed reason on failure.
    pub outcome: Result<Panels, SplitError>,
    /// Optional strategy-internal diagnostics.
    pub debug_artifacts: DebugArtifacts,
}

impl SplitResult {
    /// Build a successful result.
    #[must_use]
    pub fn success(strategy_used: &'static str, confidence: f64, panels: Panels) -> Self {
        Self {
            strategy_used,
            confidence: confidence.clamp(0.0, 1.0),
            outcome: Ok(panels),
            debug_artifacts: DebugArtifacts::new(),
        }
    }

    /// Build a failed result with zero confidence.
    #[must_use]
    pub fn failure(strategy_used: &'static str, error: SplitError) -> Self {
        Self {
            strategy_used,
            confidence: 0.0,
            outcome: Err(error),
            debug_artifacts: DebugArtifacts::new(),
        }
    }

    /// Attach debug artifacts.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: DebugArtifacts) -> Self {
        self.debug_artifacts = artifacts;
        self
    }

    /// Returns `true` if the strategy produced panels.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The four panel images, present iff the split succeeded.
    #[must_use]
    pub fn images(&self) -> Option<&[RgbImage; 4]> {
        self.outcome.as_ref().ok().map(|p| &p.images)
    }

    /// Per-panel subject bounds, if the strategy supplied them.
    #[must_use]
    pub fn bounds(&self) -> Option<&[Rect; 4]> {
        self.outcome.as_ref().ok().and_then(|p| p.bounds.as_ref())
    }

    /// Human-readable failure reason, present iff the split failed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.outcome.as_ref().err().map(ToString::to_string)
    }

    /// The typed failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&SplitError> {
        self.outcome.as_ref().err()
    }
}

/// Why a strategy (or the whole chain) did not produce panels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplitError {
    /// The image has no pixels to split.
    #[error("image is empty or too small to split ({width}x{height})")]
    EmptyImage {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The configured search band along an axis contains no lines.
    #[error("{axis} divider search band is empty")]
    EmptySearchBand {
        /// Axis whose band was empty.
        axis: Axis,
    },

    /// No line in the search zone qualifies as a divider.
    #[error("could not find a candidate for a {axis} divider")]
    NoDividerCandidate {
        /// Axis that lacked a candidate.
        axis: Axis,
    },

    /// Band scanning could not establish the divider's extent.
    #[error("could not determine {axis} divider bounds")]
    DividerBoundsNotFound {
        /// Axis whose bounds were not found.
        axis: Axis,
    },

    /// The located divider is implausibly thick.
    #[error("detected divider bounds are unreasonably large: vertical={vertical}px, horizontal={horizontal}px")]
    DividerTooLarge {
        /// Vertical divider thickness (columns).
        vertical: u32,
        /// Horizontal divider thickness (rows).
        horizontal: u32,
    },

    /// The split succeeded structurally but its confidence is too low.
    #[error("confidence {confidence:.2} is below threshold {threshold:.2}")]
    LowConfidence {
        /// Reported confidence.
        confidence: f64,
        /// Required threshold.
        threshold: f64,
    },

    /// Too few content contours survived filtering.
    #[error("found {found} valid contours, need at least {required}")]
    TooFewContours {
        /// Contours that passed the area filter.
        found: usize,
        /// Minimum needed.
        required: usize,
    },

    /// The strategy panicked; the payload message is preserved.
    #[error("strategy panicked: {0}")]
    Panicked(String),

    /// The orchestrator has no strategy to run.
    #[error("no strategies are registered")]
    NoStrategies,

    /// Every strategy in the fallback chain failed or was under-confident.
    #[error("all strategies failed")]
    PipelineExhausted,
}
