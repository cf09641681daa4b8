//! HTTP API for the remediation agent
//!
//! Exposes the ingestion boundary, the cycle trigger, the read-only status
//! boundary, and the health/metrics endpoints.

use autoheal_lib::{
    cycle::{CycleError, CycleOrchestrator, CycleOutcome},
    health::{components, ComponentStatus, HealthRegistry},
    models::HealthEvent,
    observability::AgentMetrics,
    window::{EventWindow, WindowCounters},
    workflow::{Workflow, WorkflowStore},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub window: Arc<RwLock<EventWindow>>,
    pub orchestrator: CycleOrchestrator,
    pub store: WorkflowStore,
    pub health_registry: HealthRegistry,
    pub metrics: AgentMetrics,
}

#[derive(Serialize)]
struct IngestAck {
    received: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct StatusResponse {
    metrics: WindowStatus,
    workflow: Workflow,
}

#[derive(Serialize)]
struct WindowStatus {
    window_len: usize,
    #[serde(flatten)]
    counters: WindowCounters,
}

/// Ingestion boundary: append one health event to the window. Always
/// acknowledges.
async fn ingest_log(
    State(state): State<Arc<AppState>>,
    Json(event): Json<HealthEvent>,
) -> impl IntoResponse {
    let mut window = state.window.write().await;
    window.ingest(event);

    state.metrics.inc_events_ingested();
    state.metrics.set_window_events(window.len() as i64);

    Json(IngestAck { received: true })
}

/// Cycle trigger: run one detect/diagnose/act/verify/evolve pass
async fn run_cycle(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.inc_cycles_run();
    let started = Instant::now();

    let result = state.orchestrator.run().await;
    state
        .metrics
        .observe_cycle_duration(started.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => {
            state
                .health_registry
                .set_healthy(components::WORKFLOW_STORE)
                .await;

            if let CycleOutcome::RemediationRan { reasoning } = &outcome {
                state.metrics.inc_anomalies_detected();
                let success = reasoning.action.ok && reasoning.verification.ok;
                state.metrics.observe_remediation(success);
                if reasoning.evolve.evolved {
                    state.metrics.inc_workflow_evolutions();
                    // The evolver may have appended a step
                    if let Ok(workflow) = state.store.load() {
                        state.metrics.set_workflow_steps(workflow.steps.len() as i64);
                    }
                }
                state.metrics.set_window_events(0);

                let transport_failed =
                    !reasoning.action.ok || reasoning.verification.error.is_some();
                if transport_failed {
                    state
                        .health_registry
                        .set_degraded(
                            components::MONITORED_SERVICE,
                            "transport failure during remediation",
                        )
                        .await;
                } else {
                    state
                        .health_registry
                        .set_healthy(components::MONITORED_SERVICE)
                        .await;
                }
            }

            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            if matches!(e, CycleError::Workflow(_)) {
                state
                    .health_registry
                    .set_unhealthy(components::WORKFLOW_STORE, e.to_string())
                    .await;
            }
            error!(error = %e, "Remediation cycle failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Status boundary: window counters plus the full current workflow.
/// Read-only, no side effects.
async fn status(State(state): State<Arc<AppState>>) -> Response {
    let workflow = match state.store.load() {
        Ok(workflow) => workflow,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };
    state.metrics.set_workflow_steps(workflow.steps.len() as i64);

    let window = state.window.read().await;
    let response = StatusResponse {
        metrics: WindowStatus {
            window_len: window.len(),
            counters: window.counters(),
        },
        workflow,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ingest_log", post(ingest_log))
        .route("/run_cycle", post(run_cycle))
        .route("/status", get(status))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
