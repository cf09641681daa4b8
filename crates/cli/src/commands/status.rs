//! Agent status command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, StatusResponse};
use crate::output::{format_rate, OutputFormat};

/// Row for the workflow step table
#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Params")]
    params: String,
}

/// Show the agent's window counters and current workflow
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: StatusResponse = client.get("status").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Agent Status".bold());
            println!("{}", "=".repeat(50));

            let m = &result.metrics;
            println!("Window events:          {}", m.window_len);
            println!("Total ingested:         {}", m.total_count);

            let error_line = format!("{}", m.error_count);
            if m.error_count > 0 {
                println!("Errors in window:       {}", error_line.red());
            } else {
                println!("Errors in window:       {}", error_line.green());
            }

            if m.total_count > 0 {
                let rate = m.error_count as f64 / m.total_count as f64;
                println!("Error rate:             {}", format_rate(rate));
            }
            println!();

            println!("{}", "Workflow".bold());
            println!("{}", "-".repeat(50));

            let rows: Vec<StepRow> = result
                .workflow
                .steps
                .iter()
                .map(|s| StepRow {
                    id: s.id.clone(),
                    kind: s.kind.clone(),
                    params: serde_json::to_string(&s.params).unwrap_or_default(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
