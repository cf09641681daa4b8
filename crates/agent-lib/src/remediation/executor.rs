//! Remediation action dispatch

use crate::workflow::StepKind;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Timeout for the recovery call to the monitored service
const ACTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Restart strategy used when a step carries no `method` param
const DEFAULT_METHOD: &str = "http_restart";

/// Outcome of a dispatched remediation action
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub ok: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ActionResult {
    fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
            status_code: None,
        }
    }
}

/// Dispatches remediation steps against the monitored service
pub struct ActionExecutor {
    client: Client,
    base_url: Url,
    recovery_path: String,
}

impl ActionExecutor {
    pub fn new(base_url: Url, recovery_path: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(ACTION_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            recovery_path: recovery_path.into(),
        })
    }

    /// Dispatch one remediation step.
    ///
    /// For `action_restart_service` with the `http_restart` method, any HTTP
    /// response counts as success, error statuses included; only a transport
    /// failure reports `ok: false`. Other method values report a simulated
    /// success without network I/O. Step kinds the executor does not handle
    /// report an "unknown action" failure.
    pub async fn execute(&self, kind: StepKind, params: &Map<String, Value>) -> ActionResult {
        match kind {
            StepKind::ActionRestartService => {
                let method = params
                    .get("method")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_METHOD);

                if method == DEFAULT_METHOD {
                    self.http_restart().await
                } else {
                    ActionResult {
                        ok: true,
                        detail: format!("simulated restart ({})", method),
                        status_code: None,
                    }
                }
            }
            _ => ActionResult::failure("unknown action"),
        }
    }

    async fn http_restart(&self) -> ActionResult {
        let url = match self.base_url.join(&self.recovery_path) {
            Ok(url) => url,
            Err(e) => return ActionResult::failure(format!("invalid recovery URL: {}", e)),
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                info!(%status, "Recovery endpoint called");
                ActionResult {
                    ok: true,
                    detail: format!("called {}", self.recovery_path),
                    status_code: Some(status.as_u16()),
                }
            }
            Err(e) => {
                warn!(error = %e, "Recovery call failed");
                ActionResult::failure(e.to_string())
            }
        }
    }
}
