//! Export a published snapshot as JSON.
//!
//! The export is meant to be easy to consume in notebooks or downstream scripts;
//! unavailable fields appear as `"N/A"`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::Snapshot;
use crate::error::AppError;

/// Render a snapshot as pretty JSON.
pub fn snapshot_json(snapshot: &Snapshot) -> Result<String, AppError> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| AppError::new(4, format!("Failed to serialize snapshot: {e}")))
}

/// Write a snapshot JSON file.
pub fn write_snapshot_json(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let shown = path.display();
    let mut file = File::create(path).map_err(|e| {
        let msg = format!("Failed to create export JSON '{shown}': {e}");
        AppError::new(2, msg)
    })?;

    let fail = |e: &dyn std::fmt::Display| {
        let msg = format!("Failed to write export JSON '{shown}': {e}");
        AppError::new(2, msg)
    };
    serde_json::to_writer_pretty(&mut file, snapshot).map_err(|e| fail(&e))?;
    writeln!(file).map_err(|e| fail(&e))?;

    Ok(())
}
