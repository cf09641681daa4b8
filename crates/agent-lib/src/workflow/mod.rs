//! Remediation workflow document model
//!
//! A workflow is the persisted, versioned sequence of remediation steps the
//! agent executes and evolves. Step kinds form a closed enum: a document
//! carrying an unknown kind fails to load rather than being silently
//! carried along.

mod store;

pub use store::{WorkflowError, WorkflowStore};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Known step kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    AnomalyDetection,
    ActionRestartService,
    ActionNotify,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::AnomalyDetection => write!(f, "anomaly_detection"),
            StepKind::ActionRestartService => write!(f, "action_restart_service"),
            StepKind::ActionNotify => write!(f, "action_notify"),
        }
    }
}

/// One named, typed, parameterized unit of workflow behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Step {
    /// String-valued param, if present
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Numeric param, if present (integers coerce to f64)
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    pub fn set_param(&mut self, key: &str, value: Value) {
        self.params.insert(key.to_string(), value);
    }
}

/// The persisted, versioned sequence of remediation steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn has_step(&self, id: &str) -> bool {
        self.steps.iter().any(|s| s.id == id)
    }

    /// First step of the given kind, in document order
    pub fn first_of_kind(&self, kind: StepKind) -> Option<&Step> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// First step id that violates the uniqueness invariant, if any
    fn duplicate_step_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.steps
            .iter()
            .find(|s| !seen.insert(s.id.as_str()))
            .map(|s| s.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> &'static str {
        r#"{
            "steps": [
                {"id": "detect", "type": "anomaly_detection",
                 "params": {"latency_threshold_ms": 300}},
                {"id": "restart", "type": "action_restart_service",
                 "params": {"method": "http_restart", "check_endpoint": "/"}}
            ]
        }"#
    }

    #[test]
    fn test_document_roundtrip() {
        let workflow: Workflow = serde_json::from_str(sample_document()).unwrap();
        assert_eq!(workflow.steps.len(), 2);
        assert_eq!(workflow.steps[0].kind, StepKind::AnomalyDetection);
        assert_eq!(workflow.steps[1].param_str("method"), Some("http_restart"));

        let json = serde_json::to_value(&workflow).unwrap();
        assert_eq!(json["steps"][1]["type"], "action_restart_service");
    }

    #[test]
    fn test_unknown_step_kind_fails_to_parse() {
        let doc = json!({
            "steps": [{"id": "x", "type": "action_page_oncall", "params": {}}]
        });
        assert!(serde_json::from_value::<Workflow>(doc).is_err());
    }

    #[test]
    fn test_missing_params_default_to_empty() {
        let doc = json!({
            "steps": [{"id": "restart", "type": "action_restart_service"}]
        });
        let workflow: Workflow = serde_json::from_value(doc).unwrap();
        assert!(workflow.steps[0].params.is_empty());
        assert_eq!(workflow.steps[0].param_str("method"), None);
    }

    #[test]
    fn test_param_f64_reads_integers() {
        let workflow: Workflow = serde_json::from_str(sample_document()).unwrap();
        assert_eq!(workflow.steps[0].param_f64("latency_threshold_ms"), Some(300.0));
    }

    #[test]
    fn test_first_of_kind_respects_document_order() {
        let doc = json!({
            "steps": [
                {"id": "restart-a", "type": "action_restart_service"},
                {"id": "restart-b", "type": "action_restart_service"}
            ]
        });
        let workflow: Workflow = serde_json::from_value(doc).unwrap();
        let first = workflow.first_of_kind(StepKind::ActionRestartService).unwrap();
        assert_eq!(first.id, "restart-a");
    }

    #[test]
    fn test_duplicate_step_id_detected() {
        let doc = json!({
            "steps": [
                {"id": "restart", "type": "action_restart_service"},
                {"id": "restart", "type": "action_notify"}
            ]
        });
        let workflow: Workflow = serde_json::from_value(doc).unwrap();
        assert_eq!(workflow.duplicate_step_id(), Some("restart"));
    }
}
