//! Synthetic event emitter command
//!
//! Drives the ingestion boundary with synthetic health events, for exercising
//! the agent against a local service.

use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::client::{ApiClient, HealthEvent, IngestAck};
use crate::output::{print_info, print_success, OutputFormat};

const EMIT_SERVICE: &str = "sim-service";

/// Latencies of the two-event crash burst, in order
const CRASH_BURST_LATENCIES_MS: [f64; 2] = [1200.0, 1400.0];

/// Emit synthetic health events to the agent
pub async fn emit_events(
    client: &ApiClient,
    count: u32,
    latency_ms: f64,
    level: &str,
    state: &str,
    crash: bool,
    format: OutputFormat,
) -> Result<()> {
    // --crash sends the fixed escalating burst, ignoring the other knobs
    let events: Vec<HealthEvent> = if crash {
        CRASH_BURST_LATENCIES_MS
            .iter()
            .map(|&latency| build_event("error", "crashed", latency))
            .collect()
    } else {
        (0..count)
            .map(|_| build_event(level, state, latency_ms))
            .collect()
    };

    let mut sent = 0u32;
    for event in &events {
        let ack: IngestAck = client.post("ingest_log", event).await?;
        if ack.received {
            sent += 1;
        }
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "sent": sent }));
        }
        OutputFormat::Table => {
            if crash {
                print_success(&format!(
                    "Sent crash burst: {} events (1200ms then 1400ms)",
                    sent
                ));
                print_info("Run `autoheal cycle` to trigger remediation");
            } else {
                print_success(&format!(
                    "Sent {} event(s): level={} state={} latency={}ms",
                    sent, level, state, latency_ms
                ));
            }
        }
    }

    Ok(())
}

fn build_event(level: &str, state: &str, latency_ms: f64) -> HealthEvent {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let mut metric = serde_json::Map::new();
    metric.insert("latency_ms".to_string(), serde_json::json!(latency_ms));

    HealthEvent {
        service: EMIT_SERVICE.to_string(),
        timestamp,
        metric,
        message: "synthetic".to_string(),
        level: level.to_string(),
        state: state.to_string(),
    }
}
