//! Per-image diagnostics: the classifier verdict and every strategy attempt.
//!
//! Timing uses `std::time::Instant`; durations serialize as fractional
//! seconds so a batch summary can be written as plain JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::Diagnosis;

/// Serde helper for `Duration` as fractional seconds (`f64`).
///
/// Every time in a batch summary is a plain JSON number of seconds,
/// matching `elapsed_secs` on the summary itself.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom("attempt duration must be finite and non-negative seconds")
        })
    }
}

/// Why an attempt was or was not accepted by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptVerdict {
    /// Succeeded with confidence at or above its threshold.
    Accepted,
    /// Succeeded structurally, but under its threshold.
    LowConfidence,
    /// Returned a failure.
    Failed,
}

/// One strategy invocation as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Canonical strategy name.
    pub strategy: String,
    /// Outcome class.
    pub verdict: AttemptVerdict,
    /// Self-reported confidence (0 on failure).
    pub confidence: f64,
    /// Threshold the confidence was compared against.
    pub threshold: f64,
    /// Failure reason, when the strategy failed.
    pub error: Option<String>,
    /// Wall-clock time spent in `split()` (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Everything recorded while processing one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDiagnostics {
    /// Classifier verdict and the statistics behind it.
    pub diagnosis: Diagnosis,
    /// Strategy attempts in execution order, primary first.
    pub attempts: Vec<AttemptRecord>,
    /// Whether the panels were re-centred by the standardizer.
    pub standardized: bool,
    /// Wall-clock time for the whole image (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl ImageDiagnostics {
    /// Number of attempts that were not accepted.
    #[must_use]
    pub fn rejected_attempts(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.verdict != AttemptVerdict::Accepted)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(verdict: AttemptVerdict) -> AttemptRecord {
        AttemptRecord {
            strategy: "contour_analysis".to_owned(),
            verdict,
            confidence: 0.5,
            threshold: 0.8,
            error: None,
            duration: Duration::from_millis(250),
        }
    }

    #[test]
    fn attempt_duration_serializes_as_seconds() {
        let json = serde_json::to_value(record(AttemptVerdict::LowConfidence)).unwrap();
        assert_eq!(json["duration"], serde_json::json!(0.25));
        assert_eq!(json["verdict"], serde_json::json!("low_confidence"));
    }

    #[test]
    fn total_duration_serializes_as_seconds() {
        let diagnostics = ImageDiagnostics {
            diagnosis: crate::classifier::Diagnosis {
                image_type: crate::types::ImageType::Unknown,
                horizontal: None,
                vertical: None,
                edge_std: None,
            },
            attempts: Vec::new(),
            standardized: false,
            total_duration: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["total_duration"], serde_json::json!(1.5));
    }

    #[test]
    fn attempt_round_trips_through_json() {
        let original = record(AttemptVerdict::Failed);
        let json = serde_json::to_string(&original).unwrap();
        let back: AttemptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = r#"{"strategy":"x","verdict":"failed","confidence":0.0,"threshold":0.8,"error":null,"duration":-1.0}"#;
        assert!(serde_json::from_str::<AttemptRecord>(json).is_err());
    }

    #[test]
    fn counts_rejected_attempts() {
        let diagnostics = ImageDiagnostics {
            diagnosis: crate::classifier::Diagnosis {
                image_type: crate::types::ImageType::Unknown,
                horizontal: None,
                vertical: None,
                edge_std: None,
            },
            attempts: vec![
                record(AttemptVerdict::Failed),
                record(AttemptVerdict::LowConfidence),
                record(AttemptVerdict::Accepted),
            ],
            standardized: false,
            total_duration: Duration::ZERO,
        };
        assert_eq!(diagnostics.rejected_attempts(), 2);
    }
}
