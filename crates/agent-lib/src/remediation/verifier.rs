//! Post-remediation recovery verification

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Timeout for the verification probe
const VERIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a recovery probe
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probes the monitored service to confirm a remediation worked
pub struct RecoveryVerifier {
    client: Client,
    base_url: Url,
}

impl RecoveryVerifier {
    pub fn new(base_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Probe the monitored service at `check_path`.
    ///
    /// Recovered means an HTTP 200 exactly; any other status is a failed
    /// verification. A transport failure is reported in `error`. The caller
    /// decides where `check_path` comes from.
    pub async fn verify(&self, check_path: &str) -> VerifyResult {
        let url = match self.base_url.join(check_path) {
            Ok(url) => url,
            Err(e) => {
                return VerifyResult {
                    ok: false,
                    status_code: None,
                    error: Some(format!("invalid check path: {}", e)),
                }
            }
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                VerifyResult {
                    ok: status == 200,
                    status_code: Some(status),
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, check_path, "Verification probe failed");
                VerifyResult {
                    ok: false,
                    status_code: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
