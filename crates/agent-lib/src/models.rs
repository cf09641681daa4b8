//! Core data models for the remediation agent

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metric key carrying the request latency in milliseconds
pub const LATENCY_METRIC: &str = "latency_ms";

/// Severity level of a health event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Service state reported alongside a health event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    #[default]
    Ok,
    Crashed,
    Degraded,
}

/// One health observation emitted by the monitored service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEvent {
    pub service: String,
    /// Unix timestamp in seconds
    pub timestamp: f64,
    /// Numeric metrics keyed by name
    #[serde(default)]
    pub metric: HashMap<String, f64>,
    pub message: String,
    pub level: Severity,
    #[serde(default)]
    pub state: ServiceState,
}

impl HealthEvent {
    /// True when the event signals an error condition, either through its
    /// severity or through a crashed service state
    pub fn is_error(&self) -> bool {
        self.level == Severity::Error || self.state == ServiceState::Crashed
    }

    /// Latency sample carried by this event, if any
    pub fn latency_ms(&self) -> Option<f64> {
        self.metric.get(LATENCY_METRIC).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(level: Severity, state: ServiceState) -> HealthEvent {
        HealthEvent {
            service: "sim-service".to_string(),
            timestamp: 1_700_000_000.0,
            metric: HashMap::new(),
            message: "test".to_string(),
            level,
            state,
        }
    }

    #[test]
    fn test_error_flag_from_level() {
        assert!(event(Severity::Error, ServiceState::Ok).is_error());
        assert!(!event(Severity::Warning, ServiceState::Ok).is_error());
        assert!(!event(Severity::Info, ServiceState::Degraded).is_error());
    }

    #[test]
    fn test_error_flag_from_state() {
        assert!(event(Severity::Info, ServiceState::Crashed).is_error());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "service": "sim-service",
            "timestamp": 1700000000.5,
            "message": "heartbeat",
            "level": "info"
        }"#;
        let event: HealthEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.state, ServiceState::Ok);
        assert!(event.metric.is_empty());
        assert!(event.latency_ms().is_none());
    }

    #[test]
    fn test_latency_metric_extraction() {
        let json = r#"{
            "service": "sim-service",
            "timestamp": 1700000000.0,
            "metric": {"cpu": 22.0, "latency_ms": 118.0},
            "message": "heartbeat",
            "level": "info",
            "state": "ok"
        }"#;
        let event: HealthEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.latency_ms(), Some(118.0));
    }
}
