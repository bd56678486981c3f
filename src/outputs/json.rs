//! JSON snapshot output.
//!
//! The snapshot is written pretty-printed so day-to-day changes diff cleanly.
//! The file is replaced whole: content is written to a sibling temporary file
//! and renamed over the target, so readers never see a half-written file.

use crate::models::NewsSnapshot;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Default location of the snapshot, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "docs/data/news.json";

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "news.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a [`NewsSnapshot`] to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written. Either is fatal for the run.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_snapshot(snapshot: &NewsSnapshot, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        info!(dir = %dir.display(), "Ensuring output directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    let tmp = temp_path_for(path);
    fs::write(&tmp, json).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        error!(error = %e, "Failed to move snapshot into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    info!(items = snapshot.items.len(), "Wrote news snapshot");

    Ok(())
}

/// Read a snapshot previously written by [`write_snapshot`].
#[cfg(test)]
pub async fn read_snapshot(path: &Path) -> Result<NewsSnapshot, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
