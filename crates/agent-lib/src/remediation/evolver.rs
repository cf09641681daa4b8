//! Outcome-driven workflow evolution
//!
//! The evolver is intentionally narrow: it only ever tightens latency
//! thresholds after a confirmed recovery or appends the single named
//! escalation step after a failed one. It never removes steps and never
//! changes step types.

use crate::workflow::{Step, StepKind, Workflow, WorkflowError, WorkflowStore};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Lowest latency threshold the success path will decay to
pub const MIN_LATENCY_THRESHOLD_MS: i64 = 80;

/// Multiplier applied to detection thresholds after a confirmed recovery
pub const THRESHOLD_DECAY: f64 = 0.95;

/// Id of the escalation step appended after a failed remediation
pub const NOTIFY_STEP_ID: &str = "notify_admin";

/// Threshold assumed when an anomaly_detection step carries none
const DEFAULT_LATENCY_THRESHOLD_MS: f64 = 300.0;

const ESCALATION_MESSAGE: &str = "remediation failed, manual review required";

/// Outcome of an evolution pass
#[derive(Debug, Clone, Serialize)]
pub struct EvolveResult {
    pub evolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Mutates the workflow document based on remediation outcome
#[derive(Debug, Default)]
pub struct PolicyEvolver;

impl PolicyEvolver {
    pub fn new() -> Self {
        Self
    }

    /// Apply the outcome branch to the workflow and persist it.
    ///
    /// A snapshot of the pre-mutation document is taken before each save;
    /// snapshot failure is logged and does not block the save. A failed
    /// save surfaces as an error.
    pub fn evolve(
        &self,
        store: &WorkflowStore,
        workflow: &mut Workflow,
        success: bool,
    ) -> Result<EvolveResult, WorkflowError> {
        if success {
            self.on_success(store, workflow)
        } else {
            self.on_failure(store, workflow)
        }
    }

    /// Remediation confirmed: tighten every detection threshold by 5%,
    /// truncated to an integer and floored at the minimum.
    fn on_success(
        &self,
        store: &WorkflowStore,
        workflow: &mut Workflow,
    ) -> Result<EvolveResult, WorkflowError> {
        for step in workflow
            .steps
            .iter_mut()
            .filter(|s| s.kind == StepKind::AnomalyDetection)
        {
            let current = step
                .param_f64("latency_threshold_ms")
                .unwrap_or(DEFAULT_LATENCY_THRESHOLD_MS);
            let lowered = ((current * THRESHOLD_DECAY) as i64).max(MIN_LATENCY_THRESHOLD_MS);
            step.set_param("latency_threshold_ms", Value::from(lowered));
            info!(step = %step.id, threshold_ms = lowered, "Lowered latency threshold");
        }

        self.snapshot_best_effort(store, "improved_after_success");
        store.save(workflow)?;

        Ok(EvolveResult {
            evolved: true,
            note: Some("lowered latency threshold".to_string()),
        })
    }

    /// Remediation failed: escalate by appending the notify step, exactly
    /// once. Repeated failures past the first change nothing.
    fn on_failure(
        &self,
        store: &WorkflowStore,
        workflow: &mut Workflow,
    ) -> Result<EvolveResult, WorkflowError> {
        if workflow.has_step(NOTIFY_STEP_ID) {
            return Ok(EvolveResult {
                evolved: false,
                note: None,
            });
        }

        let mut params = Map::new();
        params.insert("channel".to_string(), Value::from("console"));
        params.insert("message".to_string(), Value::from(ESCALATION_MESSAGE));
        workflow.steps.push(Step {
            id: NOTIFY_STEP_ID.to_string(),
            kind: StepKind::ActionNotify,
            params,
        });
        info!("Appended {} escalation step", NOTIFY_STEP_ID);

        self.snapshot_best_effort(store, "added_notify_after_failure");
        store.save(workflow)?;

        Ok(EvolveResult {
            evolved: true,
            note: Some("added notify_admin step".to_string()),
        })
    }

    fn snapshot_best_effort(&self, store: &WorkflowStore, reason: &str) {
        if let Err(e) = store.snapshot(reason) {
            warn!(reason, error = %e, "Workflow snapshot failed; saving anyway");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup(threshold_ms: i64) -> (TempDir, WorkflowStore, Workflow) {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(
            dir.path().join("workflow.json"),
            dir.path().join("workflow_versions"),
        );
        let workflow: Workflow = serde_json::from_value(json!({
            "steps": [
                {"id": "detect", "type": "anomaly_detection",
                 "params": {"latency_threshold_ms": threshold_ms}},
                {"id": "restart", "type": "action_restart_service",
                 "params": {"method": "http_restart", "check_endpoint": "/"}}
            ]
        }))
        .unwrap();
        store.save(&workflow).unwrap();
        (dir, store, workflow)
    }

    fn threshold_of(workflow: &Workflow) -> f64 {
        workflow.steps[0].param_f64("latency_threshold_ms").unwrap()
    }

    fn version_count(store: &WorkflowStore) -> usize {
        fs::read_dir(store.versions_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_success_lowers_threshold() {
        let (_dir, store, mut workflow) = setup(300);
        let evolver = PolicyEvolver::new();

        let result = evolver.evolve(&store, &mut workflow, true).unwrap();

        assert!(result.evolved);
        assert_eq!(result.note.as_deref(), Some("lowered latency threshold"));
        assert_eq!(threshold_of(&workflow), 285.0);
        // Persisted too
        assert_eq!(threshold_of(&store.load().unwrap()), 285.0);
    }

    #[test]
    fn test_repeated_success_decays_monotonically() {
        let (_dir, store, mut workflow) = setup(300);
        let evolver = PolicyEvolver::new();

        let mut previous = threshold_of(&workflow);
        for _ in 0..60 {
            evolver.evolve(&store, &mut workflow, true).unwrap();
            let current = threshold_of(&workflow);
            assert!(current <= previous);
            assert!(current >= MIN_LATENCY_THRESHOLD_MS as f64);
            previous = current;
        }
        assert_eq!(previous, MIN_LATENCY_THRESHOLD_MS as f64);
    }

    #[test]
    fn test_success_truncates_to_integer() {
        // 99 * 0.95 = 94.05, truncated to 94
        let (_dir, store, mut workflow) = setup(99);
        PolicyEvolver::new()
            .evolve(&store, &mut workflow, true)
            .unwrap();
        assert_eq!(threshold_of(&workflow), 94.0);
    }

    #[test]
    fn test_success_floors_at_minimum() {
        let (_dir, store, mut workflow) = setup(81);
        PolicyEvolver::new()
            .evolve(&store, &mut workflow, true)
            .unwrap();
        assert_eq!(threshold_of(&workflow), 80.0);
    }

    #[test]
    fn test_success_snapshots_before_save() {
        let (_dir, store, mut workflow) = setup(300);
        PolicyEvolver::new()
            .evolve(&store, &mut workflow, true)
            .unwrap();

        let entries: Vec<_> = fs::read_dir(store.versions_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.ends_with("__improved_after_success.json"));

        // The snapshot holds the pre-mutation threshold
        let snapshot: Workflow =
            serde_json::from_str(&fs::read_to_string(&entries[0]).unwrap()).unwrap();
        assert_eq!(threshold_of(&snapshot), 300.0);
    }

    #[test]
    fn test_snapshot_failure_does_not_block_save() {
        let (dir, store, mut workflow) = setup(300);
        // Occupy the versions path with a plain file so no snapshot can land
        fs::write(dir.path().join("workflow_versions"), "").unwrap();

        let result = PolicyEvolver::new()
            .evolve(&store, &mut workflow, true)
            .unwrap();

        assert!(result.evolved);
        // The mutation still persisted
        assert_eq!(threshold_of(&store.load().unwrap()), 285.0);
    }

    #[test]
    fn test_failure_appends_notify_step() {
        let (_dir, store, mut workflow) = setup(300);

        let result = PolicyEvolver::new()
            .evolve(&store, &mut workflow, false)
            .unwrap();

        assert!(result.evolved);
        assert_eq!(result.note.as_deref(), Some("added notify_admin step"));

        let appended = workflow.steps.last().unwrap();
        assert_eq!(appended.id, NOTIFY_STEP_ID);
        assert_eq!(appended.kind, StepKind::ActionNotify);
        assert_eq!(appended.param_str("channel"), Some("console"));
        assert_eq!(version_count(&store), 1);
    }

    #[test]
    fn test_second_failure_is_idempotent() {
        let (_dir, store, mut workflow) = setup(300);
        let evolver = PolicyEvolver::new();

        evolver.evolve(&store, &mut workflow, false).unwrap();
        let steps_after_first = workflow.steps.len();
        let versions_after_first = version_count(&store);

        let result = evolver.evolve(&store, &mut workflow, false).unwrap();

        assert!(!result.evolved);
        assert!(result.note.is_none());
        assert_eq!(workflow.steps.len(), steps_after_first);
        // No new snapshot either
        assert_eq!(version_count(&store), versions_after_first);
    }

    #[test]
    fn test_failure_does_not_touch_thresholds() {
        let (_dir, store, mut workflow) = setup(300);
        PolicyEvolver::new()
            .evolve(&store, &mut workflow, false)
            .unwrap();
        assert_eq!(threshold_of(&workflow), 300.0);
    }

    #[test]
    fn test_success_without_detection_steps_still_persists() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(
            dir.path().join("workflow.json"),
            dir.path().join("workflow_versions"),
        );
        let mut workflow: Workflow = serde_json::from_value(json!({
            "steps": [{"id": "restart", "type": "action_restart_service", "params": {}}]
        }))
        .unwrap();
        store.save(&workflow).unwrap();

        let result = PolicyEvolver::new()
            .evolve(&store, &mut workflow, true)
            .unwrap();

        assert!(result.evolved);
        assert_eq!(version_count(&store), 1);
    }
}
