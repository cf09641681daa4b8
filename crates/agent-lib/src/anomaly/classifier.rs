//! Root cause classification

use super::detector::{AnomalyVerdict, ERROR_RATE_THRESHOLD, Z_SCORE_THRESHOLD};
use serde::Serialize;
use std::fmt;

/// Discrete root cause labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCause {
    ServiceCrashOrHighErrorRate,
    LatencySpike,
    Unknown,
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootCause::ServiceCrashOrHighErrorRate => write!(f, "service_crash_or_high_error_rate"),
            RootCause::LatencySpike => write!(f, "latency_spike"),
            RootCause::Unknown => write!(f, "unknown"),
        }
    }
}

/// Map a verdict to its most likely root cause.
///
/// Total over all verdicts: one without statistics classifies as `Unknown`.
/// The error-rate check takes priority over the latency check.
pub fn classify(verdict: &AnomalyVerdict) -> RootCause {
    match verdict.stats {
        Some(stats) if stats.error_rate > ERROR_RATE_THRESHOLD => {
            RootCause::ServiceCrashOrHighErrorRate
        }
        Some(stats) if stats.z_score > Z_SCORE_THRESHOLD => RootCause::LatencySpike,
        _ => RootCause::Unknown,
    }
}
