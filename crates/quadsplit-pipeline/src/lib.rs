//! quadsplit-pipeline: Diagnosis-and-splitting core for 2x2 composites (sans-IO).
//!
//! Turns one composite image into its four panels through:
//! classification -> primary strategy -> confidence-gated fallback chain ->
//! optional re-centring of contour-based panels.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! [`RgbImage`] buffers and returns structured results. File access,
//! YAML configuration loading and debug rendering live in `quadsplit-io`.
//!
//! Logging goes through `tracing`; the host process installs the
//! subscriber.

pub mod bands;
pub mod blur;
pub mod classifier;
pub mod config;
pub mod content;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod process;
pub mod splitter;
pub mod standardize;
pub mod stats;
pub mod strategy;
pub mod threshold;
pub mod types;

pub use bands::find_precise_bounds;
pub use classifier::{Classifier, Diagnosis};
pub use config::{Config, ConfigError};
pub use content::find_content_bounds;
pub use diagnostics::{AttemptRecord, AttemptVerdict, ImageDiagnostics};
pub use process::{Pipeline, ProcessOutcome};
pub use splitter::{FALLBACK_ORDER, PIPELINE_EXHAUSTED, Splitter};
pub use standardize::standardize_and_center;
pub use strategy::{SplitStrategy, Strategy, StrategyKind, UnknownStrategy};
pub use types::{
    Axis, DebugArtifact, DebugArtifacts, DividerBounds, GrayImage, ImageType, Panels, Point,
    Quadrant, Rect, RgbImage, SplitError, SplitResult,
};
