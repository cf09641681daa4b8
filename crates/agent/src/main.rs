//! Autoheal agent - closed-loop remediation daemon
//!
//! Ingests health events from the monitored service, detects anomalies,
//! and runs remediation cycles that evolve the workflow document.

use anyhow::Result;
use autoheal_lib::{
    cycle::CycleOrchestrator,
    health::{components, HealthRegistry},
    observability::AgentMetrics,
    remediation::{ActionExecutor, RecoveryVerifier},
    window::EventWindow,
    workflow::WorkflowStore,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = AGENT_VERSION, "Starting autoheal-agent");

    // Load configuration
    let config = config::AgentConfig::load()?;
    let monitored_base = Url::parse(&config.monitored_base_url)?;
    info!(
        monitored = %monitored_base,
        workflow = %config.workflow_path,
        "Agent configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::WORKFLOW_STORE).await;
    health_registry
        .register(components::MONITORED_SERVICE)
        .await;

    // Initialize metrics
    let metrics = AgentMetrics::new();

    // Wire up the shared state and the cycle orchestrator
    let window = Arc::new(RwLock::new(EventWindow::new()));
    let store = WorkflowStore::new(config.workflow_path.clone(), config.versions_dir.clone());
    let executor = ActionExecutor::new(monitored_base.clone(), config.recovery_path.clone())?;
    let verifier = RecoveryVerifier::new(monitored_base)?;
    let orchestrator = CycleOrchestrator::new(window.clone(), store.clone(), executor, verifier);

    let app_state = Arc::new(api::AppState {
        window,
        orchestrator,
        store,
        health_registry: health_registry.clone(),
        metrics,
    });

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
