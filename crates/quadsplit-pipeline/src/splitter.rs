//! Strategy registry and the confidence-gated fallback chain.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::diagnostics::{AttemptRecord, AttemptVerdict};
use crate::strategy::{SplitStrategy, Strategy, StrategyKind};
use crate::types::{RgbImage, SplitError, SplitResult};

/// Strategies tried, in order, when the primary strategy is not accepted.
pub const FALLBACK_ORDER: [StrategyKind; 2] =
    [StrategyKind::ContourAnalysis, StrategyKind::MidpointFallback];

/// `strategy_used` of the terminal failure returned when the chain runs dry.
pub const PIPELINE_EXHAUSTED: &str = "pipeline_exhausted";

/// Name-keyed registry of configured strategies.
///
/// Built once from [`Config::strategy_pipeline`] and read-only afterwards,
/// so one instance can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct Splitter {
    strategies: BTreeMap<StrategyKind, Strategy>,
    thresholds: BTreeMap<StrategyKind, f64>,
}

impl Splitter {
    /// Instantiate every strategy named in the configuration.
    ///
    /// Strategies keep a handle on `config` rather than a copy of their
    /// section. Unknown names are logged and skipped.
    #[must_use]
    pub fn new(config: &Arc<Config>) -> Self {
        let mut strategies = BTreeMap::new();
        for name in &config.strategy_pipeline {
            match name.parse::<StrategyKind>() {
                Ok(kind) => {
                    strategies
                        .entry(kind)
                        .or_insert_with(|| Strategy::from_config(kind, config));
                }
                Err(e) => warn!(error = %e, "skipping unknown strategy"),
            }
        }
        debug!(registered = ?strategies.keys().collect::<Vec<_>>(), "strategy registry built");

        let thresholds = StrategyKind::ALL
            .into_iter()
            .map(|k| (k, config.confidence_threshold(k)))
            .collect();
        Self {
            strategies,
            thresholds,
        }
    }

    /// Look up a strategy by its configuration name.
    #[must_use]
    pub fn get_strategy(&self, name: &str) -> Option<&Strategy> {
        name.parse().ok().and_then(|kind| self.strategy(kind))
    }

    /// Look up a strategy by kind.
    #[must_use]
    pub fn strategy(&self, kind: StrategyKind) -> Option<&Strategy> {
        self.strategies.get(&kind)
    }

    /// Acceptance threshold for `kind`.
    #[must_use]
    pub fn threshold(&self, kind: StrategyKind) -> f64 {
        self.thresholds
            .get(&kind)
            .copied()
            .unwrap_or(crate::config::DEFAULT_CONFIDENCE_THRESHOLD)
    }

    /// Run the fallback chain on `image` without a file name.
    #[must_use]
    pub fn split(&self, image: &RgbImage) -> SplitResult {
        self.run_full_pipeline(image, "")
    }

    /// Run the fallback chain: the first strategy that succeeds at or
    /// above its own threshold wins.
    #[must_use]
    pub fn run_full_pipeline(&self, image: &RgbImage, filename: &str) -> SplitResult {
        self.run_full_pipeline_recorded(image, filename, &mut Vec::new())
    }

    /// [`run_full_pipeline`](Self::run_full_pipeline), appending every
    /// attempt to `attempts`.
    pub fn run_full_pipeline_recorded(
        &self,
        image: &RgbImage,
        filename: &str,
        attempts: &mut Vec<AttemptRecord>,
    ) -> SplitResult {
        if self.strategies.is_empty() {
            error!(filename, "no strategies registered");
            return SplitResult::failure(PIPELINE_EXHAUSTED, SplitError::NoStrategies);
        }

        for kind in FALLBACK_ORDER {
            let Some((result, record)) = self.attempt(kind, image, filename) else {
                debug!(strategy = %kind, "fallback strategy not registered");
                continue;
            };
            let accepted = record.verdict == AttemptVerdict::Accepted;
            attempts.push(record);
            if accepted {
                return result;
            }
        }

        error!(filename, "all strategies failed");
        SplitResult::failure(PIPELINE_EXHAUSTED, SplitError::PipelineExhausted)
    }

    /// Run one registered strategy and judge it against its threshold.
    ///
    /// A panic inside the strategy is caught here and reported as a failed
    /// result. Returns `None` if `kind` is not registered.
    pub fn attempt(
        &self,
        kind: StrategyKind,
        image: &RgbImage,
        filename: &str,
    ) -> Option<(SplitResult, AttemptRecord)> {
        let strategy = self.strategy(kind)?;
        let threshold = self.threshold(kind);

        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.split(image, filename)))
            .unwrap_or_else(|payload| {
                SplitResult::failure(kind.as_str(), SplitError::Panicked(panic_message(&*payload)))
            });
        let duration = start.elapsed();

        let verdict = match &result.outcome {
            Err(e) => {
                warn!(strategy = %kind, filename, error = %e, "strategy failed");
                AttemptVerdict::Failed
            }
            Ok(_) if result.confidence < threshold => {
                warn!(
                    strategy = %kind,
                    filename,
                    confidence = result.confidence,
                    threshold,
                    "strategy confidence below threshold"
                );
                AttemptVerdict::LowConfidence
            }
            Ok(_) => {
                info!(strategy = %kind, filename, confidence = result.confidence, "strategy accepted");
                AttemptVerdict::Accepted
            }
        };

        let record = AttemptRecord {
            strategy: kind.as_str().to_owned(),
            verdict,
            confidence: result.confidence,
            threshold,
            error: result.error_message(),
            duration,
        };
        Some((result, record))
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
