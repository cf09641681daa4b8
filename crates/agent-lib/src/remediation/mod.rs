//! Remediation actions, recovery verification, and policy evolution

mod evolver;
mod executor;
mod verifier;

pub use evolver::{
    EvolveResult, PolicyEvolver, MIN_LATENCY_THRESHOLD_MS, NOTIFY_STEP_ID, THRESHOLD_DECAY,
};
pub use executor::{ActionExecutor, ActionResult};
pub use verifier::{RecoveryVerifier, VerifyResult};
