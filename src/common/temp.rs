//! Utilities for managing throwaway work directories.

use std::fs;
use std::path::Path;

use crate::error::{Result, StewError};

/// Prepare a work directory, removing it if it exists and creating it fresh.
///
/// Nothing from a previous run survives: the directory is always destroyed
/// before it is recreated, never merged into.
pub fn prepare_work_dir(work_dir: &Path) -> Result<()> {
    // symlink_metadata so a dangling link at this path is also removed
    if let Ok(meta) = fs::symlink_metadata(work_dir) {
        if meta.is_dir() {
            fs::remove_dir_all(work_dir).map_err(|e| StewError::fs(work_dir, e))?;
        } else {
            fs::remove_file(work_dir).map_err(|e| StewError::fs(work_dir, e))?;
        }
    }

    fs::create_dir_all(work_dir).map_err(|e| StewError::fs(work_dir, e))?;
    Ok(())
}

/// Remove a work directory if present.
///
/// Returns true if something was removed.
pub fn cleanup_work_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path).map_err(|e| StewError::fs(path, e))?;
    Ok(true)
}
