//! JSON output of the completeness report.
//!
//! The report lands next to the CSV artifacts as `<prefix>_report.json`, so
//! a later job can decide which dates to re-harvest without parsing logs.

use crate::audit::CompletenessReport;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Write a [`CompletenessReport`] as pretty-printed JSON.
///
/// # Arguments
///
/// * `report` - The audit outcome to serialize
/// * `output_dir` - Directory receiving the file; must already exist
/// * `prefix` - Artifact prefix shared with the CSV files
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_report(
    report: &CompletenessReport,
    output_dir: &Path,
    prefix: &str,
) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report)?;
    let path = output_dir.join(format!("{}_report.json", prefix));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote completeness report");
    Ok(path)
}
