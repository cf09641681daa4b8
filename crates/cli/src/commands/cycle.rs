//! Remediation cycle command

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, CycleOutcome, Verdict};
use crate::output::{color_status, format_latency, format_rate, print_success, print_warning, OutputFormat};

/// Trigger one remediation cycle and report the outcome
pub async fn run_cycle(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: CycleOutcome = client.post("run_cycle", &serde_json::json!({})).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Table => match &result {
            CycleOutcome::NoAnomaly { verdict } => {
                print_success("No anomaly detected");
                print_verdict(verdict);
            }
            CycleOutcome::RemediationRan { reasoning } => {
                print_warning("Anomaly detected, remediation ran");
                print_verdict(&reasoning.verdict);
                println!();

                println!("{}", "Remediation".bold());
                println!("{}", "-".repeat(50));
                println!(
                    "Root cause:             {}",
                    color_status(&reasoning.root_cause)
                );
                println!("Action step:            {}", reasoning.action_step_id);

                let action_mark = if reasoning.action.ok {
                    "ok".green().to_string()
                } else {
                    "failed".red().to_string()
                };
                println!(
                    "Action:                 {} ({})",
                    action_mark, reasoning.action.detail
                );

                let verify_mark = if reasoning.verification.ok {
                    "recovered".green().to_string()
                } else {
                    "not recovered".red().to_string()
                };
                match reasoning.verification.status_code {
                    Some(code) => {
                        println!("Verification:           {} (HTTP {})", verify_mark, code)
                    }
                    None => println!("Verification:           {}", verify_mark),
                }

                if reasoning.evolve.evolved {
                    let note = reasoning.evolve.note.as_deref().unwrap_or("workflow updated");
                    println!("Evolution:              {}", note.cyan());
                } else {
                    println!("Evolution:              no change");
                }
            }
        },
    }

    Ok(())
}

fn print_verdict(verdict: &Verdict) {
    if let (Some(z), Some(rate)) = (verdict.z_score, verdict.error_rate) {
        println!("  z-score:    {:.2}", z);
        println!("  error rate: {}", format_rate(rate));
        if let (Some(latest), Some(mean)) = (verdict.latest_latency, verdict.mean_latency) {
            println!(
                "  latency:    {} (mean {})",
                format_latency(latest),
                format_latency(mean)
            );
        }
    }
}
