//! Per-image processing: classify, split, fall back, standardize.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::classifier::Classifier;
use crate::config::{Config, ConfigError};
use crate::diagnostics::{AttemptVerdict, ImageDiagnostics};
use crate::splitter::Splitter;
use crate::standardize::standardize_and_center;
use crate::strategy::StrategyKind;
use crate::types::{ImageType, RgbImage, SplitResult};

/// Result of processing one composite.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Classifier verdict.
    pub image_type: ImageType,
    /// Winning result (panels possibly standardized), or the terminal failure.
    pub result: SplitResult,
    /// Classifier statistics, attempts and timing.
    pub diagnostics: ImageDiagnostics,
}

impl ProcessOutcome {
    /// Whether the image produced panels.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Classifier plus strategy registry, built once per run.
///
/// Immutable after construction and `Sync`, so a batch driver can share
/// one pipeline across worker threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    classifier: Classifier,
    splitter: Splitter,
}

impl Pipeline {
    /// Validate `config` and build the classifier and strategy registry.
    ///
    /// The classifier and every strategy read from the same shared,
    /// read-only configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any configuration value is out of range.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            classifier: Classifier::new(Arc::clone(&config)),
            splitter: Splitter::new(&config),
            config,
        })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The strategy registry.
    #[must_use]
    pub const fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    /// The structural classifier.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Split one composite.
    ///
    /// The classifier picks a primary strategy. If that strategy is missing,
    /// fails or is under its threshold, the full fallback chain runs (and
    /// may retry the same strategy). A winning contour-based result is
    /// standardized when trimming is enabled and at least one panel has
    /// usable bounds.
    #[must_use]
    pub fn process(&self, image: &RgbImage, filename: &str) -> ProcessOutcome {
        let _span = info_span!("process_image", filename).entered();
        let start = Instant::now();

        let diagnosis = self.classifier.diagnose_detailed(image);
        let image_type = diagnosis.image_type;
        info!(%image_type, "classified");

        let mut attempts = Vec::new();
        let primary = image_type.primary_strategy().and_then(|kind| {
            info!(strategy = %kind, "trying primary strategy");
            let attempt = self.splitter.attempt(kind, image, filename);
            if attempt.is_none() {
                warn!(strategy = %kind, "primary strategy is not registered");
            }
            attempt
        });

        let mut result = match primary {
            Some((result, record)) if record.verdict == AttemptVerdict::Accepted => {
                attempts.push(record);
                result
            }
            other => {
                if let Some((_, record)) = other {
                    attempts.push(record);
                }
                info!("running fallback chain");
                self.splitter
                    .run_full_pipeline_recorded(image, filename, &mut attempts)
            }
        };

        let standardized = self.standardize(&mut result);
        if result.is_success() {
            info!(
                strategy = result.strategy_used,
                confidence = result.confidence,
                standardized,
                "split succeeded"
            );
        }

        ProcessOutcome {
            image_type,
            diagnostics: ImageDiagnostics {
                diagnosis,
                attempts,
                standardized,
                total_duration: start.elapsed(),
            },
            result,
        }
    }

    /// Re-centre a successful contour result in place. Returns whether it ran.
    fn standardize(&self, result: &mut SplitResult) -> bool {
        let trimming = &self.config.trimming;
        let recenters = result
            .strategy_used
            .parse::<StrategyKind>()
            .is_ok_and(StrategyKind::recenters);
        if !trimming.enabled || !recenters {
            return false;
        }
        let Ok(panels) = &mut result.outcome else {
            return false;
        };
        let Some(bounds) = panels.bounds else {
            return false;
        };
        if bounds.iter().all(crate::types::Rect::is_degenerate) {
            return false;
        }
        *panels = standardize_and_center(&panels.images, &bounds, trimming.padding);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.classifier.band_fraction = 0.0;
        assert!(matches!(
            Pipeline::new(config),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn classifier_and_strategies_share_the_config() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        // Pipeline, classifier, and the four parameterised strategies.
        assert_eq!(Arc::strong_count(pipeline.config()), 6);
        let copy = pipeline.clone();
        assert!(Arc::ptr_eq(pipeline.config(), copy.config()));
    }

    #[test]
    fn unknown_image_goes_straight_to_fallback() {
        let mut config = Config::default();
        config.midpoint_fallback.confidence_threshold = 0.1;
        let pipeline = Pipeline::new(config).unwrap();
        let outcome = pipeline.process(&RgbImage::from_pixel(1, 1, Rgb([9, 9, 9])), "dot.png");
        assert_eq!(outcome.image_type, ImageType::Unknown);
        assert!(!outcome.is_success());
        let names: Vec<_> = outcome
            .diagnostics
            .attempts
            .iter()
            .map(|a| a.strategy.as_str())
            .collect();
        assert_eq!(names, ["contour_analysis", "midpoint_fallback"]);
    }

    #[test]
    fn primary_is_retried_inside_fallback_chain() {
        let mut config = Config::default();
        config.midpoint_fallback.confidence_threshold = 0.1;
        let pipeline = Pipeline::new(config).unwrap();
        let outcome = pipeline.process(&RgbImage::from_pixel(40, 40, Rgb([9, 9, 9])), "flat.png");
        assert_eq!(outcome.image_type, ImageType::SeamlessUniform);
        assert_eq!(outcome.result.strategy_used, "midpoint_fallback");
        let names: Vec<_> = outcome
            .diagnostics
            .attempts
            .iter()
            .map(|a| a.strategy.as_str())
            .collect();
        assert_eq!(
            names,
            ["contour_analysis", "contour_analysis", "midpoint_fallback"]
        );
    }

    #[test]
    fn exhausted_pipeline_is_not_standardized() {
        let mut config = Config::default();
        config.trimming.enabled = true;
        let pipeline = Pipeline::new(config).unwrap();
        let outcome = pipeline.process(&RgbImage::from_pixel(50, 50, Rgb([9, 9, 9])), "flat.png");
        assert!(!outcome.is_success());
        assert!(!outcome.diagnostics.standardized);
        assert_eq!(outcome.result.strategy_used, "pipeline_exhausted");
    }
}
