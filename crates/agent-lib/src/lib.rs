//! Agent library for closed-loop service remediation
//!
//! This crate provides the core functionality for:
//! - Buffering streaming health events from the monitored service
//! - Statistical anomaly detection and root cause classification
//! - Versioned remediation workflow storage
//! - Action execution, recovery verification, and policy evolution
//! - Health checks and observability

pub mod anomaly;
pub mod cycle;
pub mod health;
pub mod models;
pub mod observability;
pub mod remediation;
pub mod window;
pub mod workflow;

pub use cycle::{CycleError, CycleOrchestrator, CycleOutcome, RemediationReport};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::{HealthEvent, Severity, ServiceState};
pub use observability::AgentMetrics;
pub use window::{EventWindow, WindowCounters, WINDOW_CAPACITY};
pub use workflow::{Step, StepKind, Workflow, WorkflowError, WorkflowStore};
