//! SHA-256 checksum published next to each package.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::common::write_file_with_dirs;
use crate::error::{Result, StewError};

/// Suffix appended to the package path.
pub const CHECKSUM_SUFFIX: &str = ".sha256";

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| StewError::fs(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| StewError::fs(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `<hex>  <file name>` to `<package>.sha256`, returning the checksum path.
pub fn write_checksum(package: &Path) -> Result<PathBuf> {
    let digest = sha256_file(package)?;
    let name = package
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut checksum_path = package.as_os_str().to_owned();
    checksum_path.push(CHECKSUM_SUFFIX);
    let checksum_path = PathBuf::from(checksum_path);

    write_file_with_dirs(&checksum_path, format!("{}  {}\n", digest, name))?;
    Ok(checksum_path)
}
