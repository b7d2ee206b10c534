//! Run configuration: one explicit struct per section.
//!
//! Every field has a default, and every section is `#[serde(default)]`,
//! so a partial (or empty) configuration document deserializes to a
//! complete [`Config`]. Validation runs once when the
//! [`Pipeline`](crate::Pipeline) is built; afterwards the configuration is
//! read-only and shared by reference across the classifier and all
//! strategies.

use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

/// Confidence threshold applied to any strategy that does not set one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verbose logging and debug-overlay rendering.
    pub debug_mode: bool,

    /// Strategy names to instantiate. Unknown names are logged and skipped.
    pub strategy_pipeline: Vec<String>,

    /// Structural classifier parameters.
    pub classifier: ClassifierConfig,

    /// Parameters for [`StrategyKind::ProjectionProfile`].
    pub projection_profile: ProjectionProfileConfig,

    /// Parameters for [`StrategyKind::HorizontalProjectionSplit`].
    pub horizontal_projection_split: SingleAxisConfig,

    /// Parameters for [`StrategyKind::VerticalProjectionSplit`].
    pub vertical_projection_split: SingleAxisConfig,

    /// Parameters for [`StrategyKind::ContourAnalysis`].
    pub contour_analysis: ContourAnalysisConfig,

    /// Parameters for [`StrategyKind::MidpointFallback`].
    pub midpoint_fallback: MidpointConfig,

    /// Edge-detection parameters for subject bounding boxes.
    pub content_bounds: ContentBoundsConfig,

    /// Post-processing standardization.
    pub trimming: TrimmingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_mode: false,
            strategy_pipeline: StrategyKind::ALL
                .iter()
                .map(|k| k.as_str().to_owned())
                .collect(),
            classifier: ClassifierConfig::default(),
            projection_profile: ProjectionProfileConfig::default(),
            horizontal_projection_split: SingleAxisConfig::default(),
            vertical_projection_split: SingleAxisConfig::default(),
            contour_analysis: ContourAnalysisConfig::default(),
            midpoint_fallback: MidpointConfig::default(),
            content_bounds: ContentBoundsConfig::default(),
            trimming: TrimmingConfig::default(),
        }
    }
}

impl Config {
    /// The orchestrator's acceptance threshold for a strategy.
    #[must_use]
    pub const fn confidence_threshold(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::MidpointFallback => self.midpoint_fallback.confidence_threshold,
            StrategyKind::ProjectionProfile => self.projection_profile.confidence_threshold,
            StrategyKind::HorizontalProjectionSplit => {
                self.horizontal_projection_split.confidence_threshold
            }
            StrategyKind::VerticalProjectionSplit => {
                self.vertical_projection_split.confidence_threshold
            }
            StrategyKind::ContourAnalysis => self.contour_analysis.confidence_threshold,
        }
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        fraction("classifier.band_fraction", c.band_fraction)?;
        non_negative(
            "classifier.uniform_line_threshold",
            c.uniform_line_threshold,
        )?;
        at_least_one("classifier.noise_margin", c.noise_margin)?;
        non_negative(
            "classifier.edge_uniformity_threshold",
            c.edge_uniformity_threshold,
        )?;

        let p = &self.projection_profile;
        fraction("projection_profile.search_zone_ratio", p.search_zone_ratio)?;
        positive(
            "projection_profile.consistency_threshold",
            p.consistency_threshold,
        )?;
        fraction(
            "projection_profile.max_divider_fraction",
            p.max_divider_fraction,
        )?;
        p.band_scan.validate("projection_profile")?;
        unit("projection_profile.confidence_threshold", p.confidence_threshold)?;

        for (section, s) in [
            ("horizontal_projection_split", &self.horizontal_projection_split),
            ("vertical_projection_split", &self.vertical_projection_split),
        ] {
            if !(0.0..1.0).contains(&s.search_start)
                || !(s.search_start < s.search_end && s.search_end <= 1.0)
            {
                return Err(ConfigError::InvalidRange {
                    section,
                    start: s.search_start,
                    end: s.search_end,
                });
            }
            s.band_scan.validate(section)?;
            unit("single_axis.confidence_threshold", s.confidence_threshold)?;
        }

        let ca = &self.contour_analysis;
        if ca.adaptive_block_radius == 0 {
            return Err(ConfigError::Zero("contour_analysis.adaptive_block_radius"));
        }
        unit("contour_analysis.min_area_ratio", ca.min_area_ratio)?;
        unit("contour_analysis.confidence_threshold", ca.confidence_threshold)?;

        unit(
            "midpoint_fallback.confidence_threshold",
            self.midpoint_fallback.confidence_threshold,
        )?;

        let cb = &self.content_bounds;
        non_negative("content_bounds.canny_low", f64::from(cb.canny_low))?;
        non_negative("content_bounds.canny_high", f64::from(cb.canny_high))?;

        Ok(())
    }
}

/// Parameters of the variance-band structural classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Height (for rows) or width (for columns) of the central band,
    /// as a fraction of the corresponding image dimension.
    pub band_fraction: f64,

    /// A line whose intensity standard deviation is below this is
    /// "uniform" enough to be a divider.
    pub uniform_line_threshold: f64,

    /// The band's mean standard deviation must be at least this many
    /// times the flattest line's (floored at 1.0) for a divider to count.
    pub noise_margin: f64,

    /// Width of the border strips sampled for background uniformity.
    pub edge_margin: u32,

    /// Mean per-channel standard deviation of the border strips below
    /// which the background counts as uniform.
    pub edge_uniformity_threshold: f64,
}

impl ClassifierConfig {
    /// Default [`band_fraction`](Self::band_fraction).
    pub const DEFAULT_BAND_FRACTION: f64 = 0.2;
    /// Default [`uniform_line_threshold`](Self::uniform_line_threshold).
    pub const DEFAULT_UNIFORM_LINE_THRESHOLD: f64 = 5.0;
    /// Default [`noise_margin`](Self::noise_margin).
    pub const DEFAULT_NOISE_MARGIN: f64 = 2.0;
    /// Default [`edge_margin`](Self::edge_margin).
    pub const DEFAULT_EDGE_MARGIN: u32 = 15;
    /// Default [`edge_uniformity_threshold`](Self::edge_uniformity_threshold).
    pub const DEFAULT_EDGE_UNIFORMITY_THRESHOLD: f64 = 20.0;
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            band_fraction: Self::DEFAULT_BAND_FRACTION,
            uniform_line_threshold: Self::DEFAULT_UNIFORM_LINE_THRESHOLD,
            noise_margin: Self::DEFAULT_NOISE_MARGIN,
            edge_margin: Self::DEFAULT_EDGE_MARGIN,
            edge_uniformity_threshold: Self::DEFAULT_EDGE_UNIFORMITY_THRESHOLD,
        }
    }
}

/// Parameters of the band-scan divider localization primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandScanConfig {
    /// Side of the square patch sampled at the seed. Rounded up to odd.
    pub seed_patch: u32,

    /// Length of the perpendicular band sampled at each walk step.
    /// Rounded up to odd.
    pub band_thickness: u32,

    /// Maximum allowed difference between a band median and the
    /// divider color before the walk stops.
    pub divider_color_tolerance: u8,
}

impl BandScanConfig {
    fn validate(&self, section: &'static str) -> Result<(), ConfigError> {
        if self.seed_patch == 0 || self.band_thickness == 0 {
            return Err(ConfigError::Zero(section));
        }
        Ok(())
    }
}

impl Default for BandScanConfig {
    fn default() -> Self {
        Self {
            seed_patch: 5,
            band_thickness: 21,
            divider_color_tolerance: 15,
        }
    }
}

/// Parameters of the two-axis projection-profile strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionProfileConfig {
    /// Central fraction of each axis searched for the flattest line.
    pub search_zone_ratio: f64,

    /// Standard deviation at which a seed line scores zero confidence.
    pub consistency_threshold: f64,

    /// A divider thicker than this fraction of its axis is rejected.
    pub max_divider_fraction: f64,

    /// Band-scan parameters.
    #[serde(flatten)]
    pub band_scan: BandScanConfig,

    /// Minimum confidence, applied inside the strategy and by the orchestrator.
    pub confidence_threshold: f64,
}

impl Default for ProjectionProfileConfig {
    fn default() -> Self {
        Self {
            search_zone_ratio: 0.2,
            consistency_threshold: 10.0,
            max_divider_fraction: 0.25,
            band_scan: BandScanConfig::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Parameters shared by the horizontal- and vertical-only hybrids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleAxisConfig {
    /// Start of the divider search band as a fraction of the axis.
    pub search_start: f64,

    /// End (exclusive) of the divider search band as a fraction of the axis.
    pub search_end: f64,

    /// Band-scan parameters.
    #[serde(flatten)]
    pub band_scan: BandScanConfig,

    /// Orchestrator acceptance threshold.
    pub confidence_threshold: f64,
}

impl Default for SingleAxisConfig {
    fn default() -> Self {
        Self {
            search_start: 0.4,
            search_end: 0.6,
            band_scan: BandScanConfig::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Parameters of the contour-analysis strategy for seamless layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourAnalysisConfig {
    /// Half-size of the local-mean window for adaptive thresholding.
    pub adaptive_block_radius: u32,

    /// Offset subtracted from the local mean before comparing.
    pub adaptive_offset: i32,

    /// Morphological close radius (0 disables).
    pub close_radius: u8,

    /// Morphological open radius (0 disables).
    pub open_radius: u8,

    /// Contours smaller than this fraction of the image area are dropped.
    pub min_area_ratio: f64,

    /// Maximum centre misalignment between grid neighbours, in pixels.
    pub grid_alignment_tolerance_px: f64,

    /// Orchestrator acceptance threshold.
    pub confidence_threshold: f64,
}

impl Default for ContourAnalysisConfig {
    fn default() -> Self {
        Self {
            adaptive_block_radius: 15,
            adaptive_offset: 5,
            close_radius: 7,
            open_radius: 2,
            min_area_ratio: 0.01,
            grid_alignment_tolerance_px: 50.0,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Parameters of the midpoint fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidpointConfig {
    /// Orchestrator acceptance threshold. The strategy always reports 0.2,
    /// so this must be lowered for the fallback to ever win.
    pub confidence_threshold: f64,
}

impl Default for MidpointConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Edge detection used to locate a panel's subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBoundsConfig {
    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny low threshold.
    pub canny_low: f32,
    /// Canny high threshold.
    pub canny_high: f32,
}

impl Default for ContentBoundsConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

/// Post-processing: re-center subjects on uniform canvases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimmingConfig {
    /// Whether standardization runs at all.
    pub enabled: bool,
    /// Margin added on every side of the largest subject.
    pub padding: u32,
}

impl Default for TrimmingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            padding: 15,
        }
    }
}

/// Configuration values that fail validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A value lies outside its allowed interval.
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        /// Dotted field path.
        field: &'static str,
        /// Offending value.
        value: f64,
        /// Human-readable interval.
        expected: &'static str,
    },

    /// A search band's start/end fractions are inconsistent.
    #[error("{section}: search band [{start}, {end}) must satisfy 0 <= start < end <= 1")]
    InvalidRange {
        /// Section name.
        section: &'static str,
        /// Band start.
        start: f64,
        /// Band end.
        end: f64,
    },

    /// A size parameter that must be positive is zero.
    #[error("{0}: size parameter must be greater than zero")]
    Zero(&'static str),
}

fn check(
    field: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value > 0.0 && value <= 1.0, "(0, 1]")
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, (0.0..=1.0).contains(&value), "[0, 1]")
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value >= 0.0, ">= 0")
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value > 0.0, "> 0")
}

fn at_least_one(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value >= 1.0, ">= 1")
}
