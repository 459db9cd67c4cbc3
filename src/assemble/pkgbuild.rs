//! pkgbuild and pkgutil invocations.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::process::Cmd;

/// Default location of pkgbuild.
pub const DEFAULT_PKGBUILD_BIN: &str = "/usr/bin/pkgbuild";

/// Default location of pkgutil.
pub const DEFAULT_PKGUTIL_BIN: &str = "/usr/sbin/pkgutil";

/// One pkgbuild run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgbuildInvocation {
    pub root: PathBuf,
    pub install_location: PathBuf,
    pub identifier: String,
    pub version: String,
    /// Exclusion patterns, in order. Empty for additive builds.
    pub filters: Vec<String>,
    pub output: PathBuf,
}

impl PkgbuildInvocation {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--install-location".to_string(),
            self.install_location.to_string_lossy().into_owned(),
            "--identifier".to_string(),
            self.identifier.clone(),
            "--version".to_string(),
            self.version.clone(),
            "--root".to_string(),
            self.root.to_string_lossy().into_owned(),
        ];
        for pattern in &self.filters {
            args.push("--filter".to_string());
            args.push(pattern.clone());
        }
        args.push(self.output.to_string_lossy().into_owned());
        args
    }

    /// Run pkgbuild. A partially written package is left as-is on failure.
    pub fn run(&self, pkgbuild: &Path) -> Result<()> {
        Cmd::from_path(pkgbuild)
            .args(self.args())
            .error_msg(format!("pkgbuild failed for {}", self.output.display()))
            .run_interactive()?;
        Ok(())
    }
}

/// Print the payload file list of a built package.
pub fn dump_payload(pkgutil: &Path, package: &Path) -> Result<()> {
    Cmd::from_path(pkgutil)
        .arg("--payload-files")
        .arg_path(package)
        .error_msg(format!("pkgutil could not read {}", package.display()))
        .run_interactive()?;
    Ok(())
}
