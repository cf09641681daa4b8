//! Observability infrastructure for the remediation agent
//!
//! Prometheus metrics covering the ingest path and the remediation cycle,
//! registered once in the default registry and shared through a cloneable
//! handle.

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;

/// Histogram buckets for cycle duration in seconds; a cycle includes up to
/// two outbound calls with 3s and 2s timeouts
const CYCLE_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    events_ingested: IntCounter,
    window_events: IntGauge,
    cycles_run: IntCounter,
    anomalies_detected: IntCounter,
    remediation_success: IntCounter,
    remediation_failure: IntCounter,
    workflow_evolutions: IntCounter,
    workflow_steps: IntGauge,
    cycle_duration_seconds: Histogram,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            events_ingested: register_int_counter!(
                "autoheal_events_ingested_total",
                "Total health events accepted at the ingestion boundary"
            )
            .expect("Failed to register events_ingested_total"),

            window_events: register_int_gauge!(
                "autoheal_window_events",
                "Events currently held in the analysis window"
            )
            .expect("Failed to register window_events"),

            cycles_run: register_int_counter!(
                "autoheal_cycles_run_total",
                "Total remediation cycles triggered"
            )
            .expect("Failed to register cycles_run_total"),

            anomalies_detected: register_int_counter!(
                "autoheal_anomalies_detected_total",
                "Total cycles in which the detector reported an anomaly"
            )
            .expect("Failed to register anomalies_detected_total"),

            remediation_success: register_int_counter!(
                "autoheal_remediation_success_total",
                "Total remediations with confirmed recovery"
            )
            .expect("Failed to register remediation_success_total"),

            remediation_failure: register_int_counter!(
                "autoheal_remediation_failure_total",
                "Total remediations that failed action or verification"
            )
            .expect("Failed to register remediation_failure_total"),

            workflow_evolutions: register_int_counter!(
                "autoheal_workflow_evolutions_total",
                "Total workflow mutations persisted by the evolver"
            )
            .expect("Failed to register workflow_evolutions_total"),

            workflow_steps: register_int_gauge!(
                "autoheal_workflow_steps",
                "Steps in the current workflow document"
            )
            .expect("Failed to register workflow_steps"),

            cycle_duration_seconds: register_histogram!(
                "autoheal_cycle_duration_seconds",
                "Wall time of one remediation cycle",
                CYCLE_DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a metrics handle, initializing the global metrics if needed
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_events_ingested(&self) {
        self.inner().events_ingested.inc();
    }

    pub fn set_window_events(&self, count: i64) {
        self.inner().window_events.set(count);
    }

    pub fn inc_cycles_run(&self) {
        self.inner().cycles_run.inc();
    }

    pub fn inc_anomalies_detected(&self) {
        self.inner().anomalies_detected.inc();
    }

    /// Record a remediation outcome
    pub fn observe_remediation(&self, success: bool) {
        if success {
            self.inner().remediation_success.inc();
        } else {
            self.inner().remediation_failure.inc();
        }
    }

    pub fn inc_workflow_evolutions(&self) {
        self.inner().workflow_evolutions.inc();
    }

    pub fn set_workflow_steps(&self, count: i64) {
        self.inner().workflow_steps.set(count);
    }

    pub fn observe_cycle_duration(&self, duration_secs: f64) {
        self.inner().cycle_duration_seconds.observe(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Encoder;

    #[test]
    fn test_metrics_register_once_and_expose() {
        let metrics = AgentMetrics::new();
        // A second handle shares the same globals
        let other = metrics.clone();

        metrics.inc_events_ingested();
        other.inc_events_ingested();
        metrics.set_window_events(7);
        metrics.observe_remediation(true);
        metrics.observe_remediation(false);
        metrics.observe_cycle_duration(0.042);

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("autoheal_events_ingested_total"));
        assert!(text.contains("autoheal_window_events 7"));
        assert!(text.contains("autoheal_remediation_success_total"));
        assert!(text.contains("autoheal_cycle_duration_seconds_bucket"));
    }
}
