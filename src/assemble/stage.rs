//! Staging tree construction for additive builds.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::common::{list_dir_sorted, prepare_work_dir};
use crate::error::{Result, StewError};
use crate::process::Cmd;

/// Default location of rsync.
pub const DEFAULT_RSYNC_BIN: &str = "/usr/bin/rsync";

/// Destroy any previous staging root and create an empty one.
pub fn prepare_staging_root(staging_root: &Path) -> Result<()> {
    info!(path = %staging_root.display(), "Preparing staging root");
    prepare_work_dir(staging_root)
}

/// Where a prefix lands inside the staging root.
///
/// Sources are copied with their absolute paths preserved, so `/usr/local`
/// stages to `<staging_root>/usr/local`.
pub fn payload_root(staging_root: &Path, install_prefix: &Path) -> PathBuf {
    let relative = install_prefix.strip_prefix("/").unwrap_or(install_prefix);
    staging_root.join(relative)
}

/// Top-level entries of `<prefix>/opt`. A missing directory stages nothing.
pub fn opt_entries(install_prefix: &Path) -> Result<Vec<PathBuf>> {
    let opt = install_prefix.join("opt");
    if !opt.is_dir() {
        warn!(path = %opt.display(), "opt directory missing, nothing to stage");
        return Ok(Vec::new());
    }
    list_dir_sorted(&opt)
}

/// Copies lists of absolute paths into the staging root with rsync.
#[derive(Debug, Clone)]
pub struct Stager {
    rsync: PathBuf,
    staging_root: PathBuf,
}

impl Stager {
    pub fn new(rsync: impl AsRef<Path>, staging_root: impl AsRef<Path>) -> Self {
        Self {
            rsync: rsync.as_ref().to_path_buf(),
            staging_root: staging_root.as_ref().to_path_buf(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Stage every path in one rsync run, preserving attributes and links.
    ///
    /// Parent directories are created by rsync. An empty list is a no-op.
    pub fn stage<P: AsRef<Path>>(&self, sources: &[P]) -> Result<usize> {
        if sources.is_empty() {
            return Ok(0);
        }

        let mut list = NamedTempFile::new().map_err(|e| StewError::fs(std::env::temp_dir(), e))?;
        for source in sources {
            writeln!(list, "{}", source.as_ref().display())
                .map_err(|e| StewError::fs(list.path(), e))?;
        }
        list.flush().map_err(|e| StewError::fs(list.path(), e))?;

        Cmd::from_path(&self.rsync)
            .arg("-a")
            .arg("--files-from")
            .arg_path(list.path())
            .arg("/")
            .arg_path(&self.staging_root)
            .error_msg(format!(
                "rsync failed staging {} paths into {}",
                sources.len(),
                self.staging_root.display()
            ))
            .run()?;

        Ok(sources.len())
    }
}
