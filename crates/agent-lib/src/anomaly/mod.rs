//! Anomaly detection and root cause classification
//!
//! The detector is a deliberately simple heuristic: a z-score on the newest
//! latency sample plus an error rate over the window. Its thresholds are
//! fixed constants of the detector, independent of workflow configuration.

mod classifier;
mod detector;

pub use classifier::{classify, RootCause};
pub use detector::{
    analyze, AnomalyVerdict, VerdictStats, ERROR_RATE_THRESHOLD, Z_SCORE_THRESHOLD,
};
