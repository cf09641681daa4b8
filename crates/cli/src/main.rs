//! Autoheal CLI
//!
//! A command-line tool for inspecting the remediation agent, triggering
//! cycles, browsing workflow version history, and emitting synthetic events.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cycle, emit, status, versions};

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Autoheal CLI
#[derive(Parser)]
#[command(name = "autoheal")]
#[command(author, version, about = "CLI for the autoheal remediation agent", long_about = None)]
pub struct Cli {
    /// Agent API URL (can also be set via AUTOHEAL_API_URL env var)
    #[arg(long, env = "AUTOHEAL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show window counters and the current workflow
    Status,

    /// Trigger one remediation cycle
    Cycle,

    /// List workflow version snapshots
    Versions {
        /// Versions directory to read
        #[arg(long, default_value = "workflow_versions")]
        dir: String,

        /// Maximum number of snapshots to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Emit synthetic health events to the agent
    Emit {
        /// Number of events to send
        #[arg(long, short, default_value_t = 1)]
        count: u32,

        /// Latency metric carried by each event
        #[arg(long, default_value_t = 100.0)]
        latency_ms: f64,

        /// Event level (info, warning, error)
        #[arg(long, default_value = "info")]
        level: String,

        /// Service state (ok, crashed, degraded)
        #[arg(long, default_value = "ok")]
        state: String,

        /// Send the two-event escalating crash burst (overrides count,
        /// level, state, and latency)
        #[arg(long)]
        crash: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flag and env var win over the config file; the file over the default
    let file_config = config::Config::load().unwrap_or_default();
    let api_url = cli
        .api_url
        .or(file_config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
        Commands::Cycle => {
            cycle::run_cycle(&client, cli.format).await?;
        }
        Commands::Versions { dir, limit } => {
            versions::list_versions(&dir, limit, cli.format)?;
        }
        Commands::Emit {
            count,
            latency_ms,
            level,
            state,
            crash,
        } => {
            emit::emit_events(&client, count, latency_ms, &level, &state, crash, cli.format)
                .await?;
        }
    }

    Ok(())
}
