//! The detect → diagnose → act → verify → evolve cycle
//!
//! One orchestrator instance owns a full pass over the shared state: it
//! reloads the workflow from durable storage (so each cycle sees the latest
//! evolved policy), analyzes a window snapshot, and only clears the window
//! when a remediation actually ran.

use crate::anomaly::{analyze, classify, AnomalyVerdict, RootCause};
use crate::remediation::{
    ActionExecutor, ActionResult, EvolveResult, PolicyEvolver, RecoveryVerifier, VerifyResult,
};
use crate::window::EventWindow;
use crate::workflow::{StepKind, WorkflowError, WorkflowStore};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Check path used when the last workflow step carries no `check_endpoint`
const DEFAULT_CHECK_PATH: &str = "/";

/// Fatal cycle errors. Transport failures are not errors here; they are
/// captured in the result structs and feed the evolver's failure branch.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Configuration error: surfaced to the caller rather than silently
    /// skipped. The window is left intact.
    #[error("workflow has no action_restart_service step")]
    NoRestartStep,
}

/// Outcome of one cycle, as returned to the trigger boundary
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    NoAnomaly { verdict: AnomalyVerdict },
    RemediationRan { reasoning: RemediationReport },
}

/// Full reasoning chain of a remediation attempt
#[derive(Debug, Clone, Serialize)]
pub struct RemediationReport {
    pub verdict: AnomalyVerdict,
    pub root_cause: RootCause,
    pub action_step_id: String,
    pub action: ActionResult,
    pub verification: VerifyResult,
    pub evolve: EvolveResult,
}

/// Runs remediation cycles over the shared window and workflow store
pub struct CycleOrchestrator {
    window: Arc<RwLock<EventWindow>>,
    store: WorkflowStore,
    executor: ActionExecutor,
    verifier: RecoveryVerifier,
    evolver: PolicyEvolver,
    /// At most one cycle executes at a time; the load/snapshot/save sequence
    /// of one cycle must never interleave with another's.
    cycle_lock: Mutex<()>,
}

impl CycleOrchestrator {
    pub fn new(
        window: Arc<RwLock<EventWindow>>,
        store: WorkflowStore,
        executor: ActionExecutor,
        verifier: RecoveryVerifier,
    ) -> Self {
        Self {
            window,
            store,
            executor,
            verifier,
            evolver: PolicyEvolver::new(),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Run one full pass.
    ///
    /// A fatal workflow load error aborts with no side effects. A
    /// no-anomaly pass leaves the window intact; only a completed
    /// remediation clears it.
    pub async fn run(&self) -> Result<CycleOutcome, CycleError> {
        let _guard = self.cycle_lock.lock().await;

        let mut workflow = self.store.load()?;

        let events = self.window.read().await.snapshot();
        let verdict = analyze(&events);
        if !verdict.is_anomalous {
            info!(events = events.len(), "No anomaly detected");
            return Ok(CycleOutcome::NoAnomaly { verdict });
        }

        let root_cause = classify(&verdict);
        info!(%root_cause, events = events.len(), "Anomaly detected");

        let restart = workflow
            .first_of_kind(StepKind::ActionRestartService)
            .cloned()
            .ok_or(CycleError::NoRestartStep)?;
        let action = self.executor.execute(restart.kind, &restart.params).await;

        // The verification target comes from whatever the document's final
        // step carries; step ordering is operationally significant here.
        let check_path = workflow
            .steps
            .last()
            .and_then(|s| s.param_str("check_endpoint"))
            .unwrap_or(DEFAULT_CHECK_PATH)
            .to_string();
        let verification = self.verifier.verify(&check_path).await;

        let success = action.ok && verification.ok;
        let evolve = self.evolver.evolve(&self.store, &mut workflow, success)?;

        self.window.write().await.reset();
        info!(success, evolved = evolve.evolved, "Remediation cycle completed");

        Ok(CycleOutcome::RemediationRan {
            reasoning: RemediationReport {
                verdict,
                root_cause,
                action_step_id: restart.id,
                action,
                verification,
                evolve,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthEvent, ServiceState, Severity};
    use crate::remediation::NOTIFY_STEP_ID;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;
    use url::Url;

    fn latency_event(latency_ms: f64, crashed: bool) -> HealthEvent {
        let mut metric = HashMap::new();
        metric.insert("latency_ms".to_string(), latency_ms);
        HealthEvent {
            service: "sim-service".to_string(),
            timestamp: 1_700_000_000.0,
            metric,
            message: "synthetic".to_string(),
            level: if crashed { Severity::Error } else { Severity::Info },
            state: if crashed {
                ServiceState::Crashed
            } else {
                ServiceState::Ok
            },
        }
    }

    fn write_workflow(dir: &TempDir, doc: serde_json::Value) -> WorkflowStore {
        let store = WorkflowStore::new(
            dir.path().join("workflow.json"),
            dir.path().join("workflow_versions"),
        );
        fs::write(store.path(), serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
        store
    }

    fn standard_workflow() -> serde_json::Value {
        json!({
            "steps": [
                {"id": "detect", "type": "anomaly_detection",
                 "params": {"latency_threshold_ms": 300}},
                {"id": "restart", "type": "action_restart_service",
                 "params": {"method": "http_restart", "check_endpoint": "/"}}
            ]
        })
    }

    fn orchestrator(base_url: &str, store: WorkflowStore) -> CycleOrchestrator {
        let base = Url::parse(base_url).unwrap();
        CycleOrchestrator::new(
            Arc::new(RwLock::new(EventWindow::new())),
            store,
            ActionExecutor::new(base.clone(), "/recover").unwrap(),
            RecoveryVerifier::new(base).unwrap(),
        )
    }

    async fn fill_anomalous(orchestrator: &CycleOrchestrator) {
        let mut window = orchestrator.window.write().await;
        // One crash in four events: error rate 0.25
        for _ in 0..3 {
            window.ingest(latency_event(100.0, false));
        }
        window.ingest(latency_event(1200.0, true));
    }

    #[tokio::test]
    async fn test_missing_workflow_aborts_with_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(
            dir.path().join("workflow.json"),
            dir.path().join("workflow_versions"),
        );
        let orch = orchestrator("http://127.0.0.1:1", store);
        fill_anomalous(&orch).await;

        let result = orch.run().await;
        assert!(matches!(result, Err(CycleError::Workflow(_))));
        assert_eq!(orch.window.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_no_anomaly_leaves_window_intact() {
        let dir = TempDir::new().unwrap();
        let store = write_workflow(&dir, standard_workflow());
        let orch = orchestrator("http://127.0.0.1:1", store);

        {
            let mut window = orch.window.write().await;
            for _ in 0..5 {
                window.ingest(latency_event(100.0, false));
            }
        }

        let outcome = orch.run().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::NoAnomaly { .. }));
        assert_eq!(orch.window.read().await.len(), 5);
        assert_eq!(orch.window.read().await.counters().total_count, 5);
    }

    #[tokio::test]
    async fn test_successful_remediation_clears_window_and_evolves() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/recover")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let store = write_workflow(&dir, standard_workflow());
        let orch = orchestrator(&server.url(), store);
        fill_anomalous(&orch).await;

        let outcome = orch.run().await.unwrap();
        let report = match outcome {
            CycleOutcome::RemediationRan { reasoning } => reasoning,
            other => panic!("expected remediation, got {:?}", other),
        };

        assert_eq!(report.root_cause, RootCause::ServiceCrashOrHighErrorRate);
        assert_eq!(report.action_step_id, "restart");
        assert!(report.action.ok);
        assert!(report.verification.ok);
        assert!(report.evolve.evolved);

        // Window fully reset
        let window = orch.window.read().await;
        assert!(window.is_empty());
        assert_eq!(window.counters().total_count, 0);
        assert_eq!(window.counters().error_count, 0);

        // Threshold tightened and persisted: 300 -> 285
        let evolved = orch.store.load().unwrap();
        assert_eq!(
            evolved.steps[0].param_f64("latency_threshold_ms"),
            Some(285.0)
        );
    }

    #[tokio::test]
    async fn test_failed_verification_appends_notify_once() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/recover")
            .with_status(200)
            .create_async()
            .await;
        // Probe says the service is still broken
        server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let store = write_workflow(&dir, standard_workflow());
        let orch = orchestrator(&server.url(), store);

        fill_anomalous(&orch).await;
        let first = orch.run().await.unwrap();
        let report = match first {
            CycleOutcome::RemediationRan { reasoning } => reasoning,
            other => panic!("expected remediation, got {:?}", other),
        };
        assert!(!report.verification.ok);
        assert!(report.evolve.evolved);

        let evolved = orch.store.load().unwrap();
        assert!(evolved.has_step(NOTIFY_STEP_ID));
        let steps_after_first = evolved.steps.len();

        // Second failed cycle: idempotent, no duplicate step
        fill_anomalous(&orch).await;
        let second = orch.run().await.unwrap();
        let report = match second {
            CycleOutcome::RemediationRan { reasoning } => reasoning,
            other => panic!("expected remediation, got {:?}", other),
        };
        assert!(!report.evolve.evolved);
        assert_eq!(orch.store.load().unwrap().steps.len(), steps_after_first);
    }

    #[tokio::test]
    async fn test_verification_uses_last_step_check_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/recover")
            .with_status(200)
            .create_async()
            .await;
        let probe = server
            .mock("GET", "/deep/health")
            .with_status(200)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let store = write_workflow(
            &dir,
            json!({
                "steps": [
                    {"id": "restart", "type": "action_restart_service",
                     "params": {"method": "http_restart"}},
                    {"id": "notify", "type": "action_notify",
                     "params": {"check_endpoint": "/deep/health"}}
                ]
            }),
        );
        let orch = orchestrator(&server.url(), store);
        fill_anomalous(&orch).await;

        let outcome = orch.run().await.unwrap();
        probe.assert_async().await;
        assert!(matches!(outcome, CycleOutcome::RemediationRan { .. }));
    }

    #[tokio::test]
    async fn test_missing_restart_step_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let store = write_workflow(
            &dir,
            json!({
                "steps": [{"id": "detect", "type": "anomaly_detection", "params": {}}]
            }),
        );
        let orch = orchestrator("http://127.0.0.1:1", store);
        fill_anomalous(&orch).await;

        let result = orch.run().await;
        assert!(matches!(result, Err(CycleError::NoRestartStep)));
        // No mutation happened
        assert_eq!(orch.window.read().await.len(), 4);
        assert!(!orch.store.versions_dir().exists());
    }

    #[tokio::test]
    async fn test_transport_failure_feeds_failure_branch() {
        // No monitored service at all: action and probe both fail transport
        let dir = TempDir::new().unwrap();
        let store = write_workflow(&dir, standard_workflow());
        let orch = orchestrator("http://127.0.0.1:1", store);
        fill_anomalous(&orch).await;

        let outcome = orch.run().await.unwrap();
        let report = match outcome {
            CycleOutcome::RemediationRan { reasoning } => reasoning,
            other => panic!("expected remediation, got {:?}", other),
        };

        assert!(!report.action.ok);
        assert!(!report.verification.ok);
        assert!(report.verification.error.is_some());
        // Failure branch ran: notify step appended
        assert!(orch.store.load().unwrap().has_step(NOTIFY_STEP_ID));
        // Completed cycle still clears the window
        assert!(orch.window.read().await.is_empty());
    }
}
