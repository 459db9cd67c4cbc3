//! Utilities for file operations with automatic parent directory creation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StewError};

/// Write a file, creating parent directories as needed.
///
/// This is a convenience function that combines creating the parent directory
/// with writing the file content, eliminating the common pattern of:
/// ```ignore
/// if let Some(parent) = path.parent() {
///     fs::create_dir_all(parent)?;
/// }
/// fs::write(path, content)?;
/// ```
pub fn write_file_with_dirs<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StewError::fs(parent, e))?;
    }
    fs::write(path, content).map_err(|e| StewError::fs(path, e))?;
    Ok(())
}

/// Top-level entries of a directory, sorted by path.
pub fn list_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StewError::fs(dir, e))? {
        let entry = entry.map_err(|e| StewError::fs(dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}
