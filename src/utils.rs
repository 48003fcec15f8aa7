//! File system helpers.

use crate::error::Result;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file so
/// an unwritable output location fails before any page is fetched rather
/// than at the first checkpoint.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    let probe = path.join(".__probe_write__");
    stdfs::File::create(&probe)?;
    let _ = stdfs::remove_file(&probe);
    info!("Output directory is writable");
    Ok(())
}
