//! Latency z-score and error-rate detection

use crate::models::HealthEvent;
use serde::Serialize;

/// Z-score above which the newest latency sample counts as a spike
pub const Z_SCORE_THRESHOLD: f64 = 2.0;

/// Fraction of error events above which the window counts as anomalous
pub const ERROR_RATE_THRESHOLD: f64 = 0.15;

/// Guards the z-score against division by zero on constant latency series
const STD_EPSILON: f64 = 1e-6;

/// Detector output with supporting statistics
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyVerdict {
    pub is_anomalous: bool,
    /// Absent when the window carried no latency samples
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub stats: Option<VerdictStats>,
}

/// Statistics backing an anomaly verdict
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VerdictStats {
    pub z_score: f64,
    pub error_rate: f64,
    pub latest_latency: f64,
    pub mean_latency: f64,
    pub std_latency: f64,
}

/// Analyze a window snapshot and return an anomaly verdict.
///
/// The latency series is built from events that carry a `latency_ms` metric;
/// the error rate counts error-or-crashed events over the whole snapshot.
/// An empty latency series is a defined degenerate case: the verdict is
/// non-anomalous and carries no statistics.
pub fn analyze(events: &[HealthEvent]) -> AnomalyVerdict {
    let latencies: Vec<f64> = events.iter().filter_map(|e| e.latency_ms()).collect();

    if latencies.is_empty() {
        return AnomalyVerdict {
            is_anomalous: false,
            stats: None,
        };
    }

    let count = latencies.len() as f64;
    let mean = latencies.iter().sum::<f64>() / count;
    // Population variance, matching the detector's contract
    let variance = latencies.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
    let std = variance.sqrt();
    let latest = latencies[latencies.len() - 1];
    let z_score = (latest - mean) / (std + STD_EPSILON);

    let errors = events.iter().filter(|e| e.is_error()).count();
    let error_rate = errors as f64 / events.len() as f64;

    AnomalyVerdict {
        is_anomalous: z_score > Z_SCORE_THRESHOLD || error_rate > ERROR_RATE_THRESHOLD,
        stats: Some(VerdictStats {
            z_score,
            error_rate,
            latest_latency: latest,
            mean_latency: mean,
            std_latency: std,
        }),
    }
}
