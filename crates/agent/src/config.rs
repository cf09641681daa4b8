//! Agent configuration

use anyhow::Result;
use serde::Deserialize;

/// Agent configuration, read from `AUTOHEAL_`-prefixed environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// API server port for the agent endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Base URL of the monitored service
    #[serde(default = "default_monitored_base_url")]
    pub monitored_base_url: String,

    /// Recovery trigger path on the monitored service
    #[serde(default = "default_recovery_path")]
    pub recovery_path: String,

    /// Path of the workflow document
    #[serde(default = "default_workflow_path")]
    pub workflow_path: String,

    /// Directory receiving pre-mutation workflow snapshots
    #[serde(default = "default_versions_dir")]
    pub versions_dir: String,
}

fn default_api_port() -> u16 {
    8080
}

fn default_monitored_base_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_recovery_path() -> String {
    "/recover".to_string()
}

fn default_workflow_path() -> String {
    "workflow.json".to_string()
}

fn default_versions_dir() -> String {
    "workflow_versions".to_string()
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AUTOHEAL"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| AgentConfig {
            api_port: default_api_port(),
            monitored_base_url: default_monitored_base_url(),
            recovery_path: default_recovery_path(),
            workflow_path: default_workflow_path(),
            versions_dir: default_versions_dir(),
        }))
    }
}
