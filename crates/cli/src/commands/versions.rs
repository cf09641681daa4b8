//! Workflow version history command

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::{format_timestamp, print_table, print_warning, OutputFormat};

/// Row for the version snapshot table
#[derive(Tabled, Serialize)]
struct VersionRow {
    #[tabled(rename = "Saved At")]
    saved_at: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "File")]
    file: String,
}

/// List workflow snapshots from the agent's versions directory.
///
/// Snapshot filenames carry their own history: `<timestamp>__<reason>.json`,
/// written before every workflow mutation.
pub fn list_versions(dir: &str, limit: usize, format: OutputFormat) -> Result<()> {
    let dir = Path::new(dir);
    if !dir.is_dir() {
        print_warning(&format!("No versions directory at {}", dir.display()));
        return Ok(());
    }

    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir).context("Failed to read versions directory")? {
        let entry = entry.context("Failed to read directory entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            names.push(name);
        }
    }

    // The timestamp prefix makes lexicographic order chronological;
    // newest first.
    names.sort();
    names.reverse();
    names.truncate(limit);

    let rows: Vec<VersionRow> = names
        .iter()
        .map(|name| {
            let stem = name.trim_end_matches(".json");
            let (ts, reason) = match stem.split_once("__") {
                Some((ts, reason)) => (ts, reason.replace('_', " ")),
                None => (stem, String::new()),
            };
            VersionRow {
                saved_at: format_timestamp(ts),
                reason,
                file: name.clone(),
            }
        })
        .collect();

    print_table(&rows, format);

    Ok(())
}
