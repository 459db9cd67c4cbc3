//! Package assembly.
//!
//! Two strategies decide what goes into the package:
//!
//! - **Subtractive**: package the live prefix in place and hand pkgbuild a
//!   list of exclusion filters. Fast, but anything the unbrewed query misses
//!   leaks into the package.
//! - **Additive**: build a fresh staging tree containing only formula files,
//!   qualifying symlinks and the `opt` links, then package that tree.
//!
//! A build moves through [`BuildPhase`]s; `Staging` only happens for
//! additive builds. There is no rollback: a failed build leaves whatever it
//! wrote behind, and the next additive build wipes the staging root.

mod checksum;
mod filters;
mod pkgbuild;
mod stage;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use crate::brew::Brew;
use crate::config::Config;
use crate::error::{Result, StewError};
use crate::inventory::{Formula, Inventory};
use crate::symlinks::{self, LinkPolicyKind};
use crate::timing::Timer;

pub use checksum::{sha256_file, write_checksum, CHECKSUM_SUFFIX};
pub use filters::{subtractive_filters, BUILTIN_EXCLUSIONS, KNOWN_PROBLEM_PATHS};
pub use pkgbuild::{dump_payload, PkgbuildInvocation, DEFAULT_PKGBUILD_BIN, DEFAULT_PKGUTIL_BIN};
pub use stage::{opt_entries, payload_root, prepare_staging_root, Stager, DEFAULT_RSYNC_BIN};

/// How the package payload is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Subtractive,
    Additive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Subtractive => write!(f, "subtractive"),
            Strategy::Additive => write!(f, "additive"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subtractive" => Ok(Strategy::Subtractive),
            "additive" => Ok(Strategy::Additive),
            other => Err(format!(
                "unknown strategy '{}' (expected subtractive or additive)",
                other
            )),
        }
    }
}

/// Build state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    NotBuilt,
    Staging,
    Packaging,
    Packaged,
}

/// `<name>_<strategy>-<version>.pkg`
pub fn artifact_file_name(name: &str, strategy: Strategy, version: &str) -> String {
    format!("{}_{}-{}.pkg", name, strategy, version)
}

/// Today's date (UTC) as `YYYY.MM.DD`.
pub fn default_version() -> String {
    chrono::Utc::now().format("%Y.%m.%d").to_string()
}

/// What the assembler needs from the inventory.
#[derive(Debug, Clone, Copy)]
pub struct BuildInputs<'a> {
    pub formulae: &'a [Formula],
    pub unmanaged: &'a BTreeSet<PathBuf>,
    pub install_prefix: &'a Path,
}

/// A finished package.
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    pub path: PathBuf,
    pub checksum_path: PathBuf,
    pub strategy: Strategy,
    pub version: String,
    /// Directory pkgbuild was rooted at.
    pub payload_root: PathBuf,
    pub phases: Vec<BuildPhase>,
}

/// Builds packages from an inventory snapshot.
#[derive(Debug, Clone)]
pub struct Assembler {
    pub brew: Brew,
    pub rsync: PathBuf,
    pub pkgbuild: PathBuf,
    /// Base name of the package file.
    pub name: String,
    pub identifier: String,
    /// `--install-location` given to pkgbuild.
    pub install_location: PathBuf,
    pub output_dir: PathBuf,
    pub staging_root: PathBuf,
    /// Extra subtractive filters on top of the built-in ones.
    pub extra_filters: Vec<String>,
    pub link_policy: LinkPolicyKind,
}

impl Assembler {
    pub fn from_config(config: &Config, brew: Brew) -> Self {
        Self {
            brew,
            rsync: config.rsync_bin.clone(),
            pkgbuild: config.pkgbuild_bin.clone(),
            name: config.pkg_name.clone(),
            identifier: config.pkg_identifier.clone(),
            install_location: config.install_location.clone(),
            output_dir: config.output_dir.clone(),
            staging_root: config.staging_root.clone(),
            extra_filters: config.extra_filters.clone(),
            link_policy: config.link_policy,
        }
    }

    /// Build from an inventory snapshot.
    pub fn build_inventory(
        &self,
        inventory: &Inventory,
        strategy: Strategy,
        version: Option<&str>,
    ) -> Result<BuiltArtifact> {
        let formulae = inventory.installed_formulae();
        let inputs = BuildInputs {
            formulae: &formulae,
            unmanaged: &inventory.unmanaged,
            install_prefix: &inventory.prefix,
        };
        self.build(&inputs, strategy, version)
    }

    /// Produce `<output_dir>/<name>_<strategy>-<version>.pkg`.
    pub fn build(
        &self,
        inputs: &BuildInputs<'_>,
        strategy: Strategy,
        version: Option<&str>,
    ) -> Result<BuiltArtifact> {
        let version = version.map(str::to_string).unwrap_or_else(default_version);
        let path = self
            .output_dir
            .join(artifact_file_name(&self.name, strategy, &version));

        let mut phases = vec![BuildPhase::NotBuilt];
        info!(%strategy, %version, "Building package");

        let (payload_root, filters) = match strategy {
            Strategy::Subtractive => (
                inputs.install_prefix.to_path_buf(),
                subtractive_filters(inputs.unmanaged, &self.extra_filters),
            ),
            Strategy::Additive => {
                phases.push(BuildPhase::Staging);
                let t = Timer::start("Staging");
                let root = self.stage(inputs)?;
                t.finish();
                (root, Vec::new())
            }
        };

        phases.push(BuildPhase::Packaging);
        fs::create_dir_all(&self.output_dir).map_err(|e| StewError::fs(&self.output_dir, e))?;

        let invocation = PkgbuildInvocation {
            root: payload_root.clone(),
            install_location: self.install_location.clone(),
            identifier: self.identifier.clone(),
            version: version.clone(),
            filters,
            output: path.clone(),
        };
        info!(
            root = %invocation.root.display(),
            filters = invocation.filters.len(),
            "Calling pkgbuild"
        );
        let t = Timer::start("Packaging");
        invocation.run(&self.pkgbuild)?;
        t.finish();

        let checksum_path = write_checksum(&path)?;
        phases.push(BuildPhase::Packaged);
        info!(path = %path.display(), "Package built");

        Ok(BuiltArtifact {
            path,
            checksum_path,
            strategy,
            version,
            payload_root,
            phases,
        })
    }

    /// Populate a fresh staging root; returns the directory to package.
    fn stage(&self, inputs: &BuildInputs<'_>) -> Result<PathBuf> {
        let prefix = inputs.install_prefix;
        prepare_staging_root(&self.staging_root)?;
        let stager = Stager::new(&self.rsync, &self.staging_root);

        let names: Vec<String> = inputs
            .formulae
            .iter()
            .filter(|f| f.is_installed())
            .map(|f| f.name.clone())
            .collect();
        let files = self.brew.list_files(&names)?;
        info!(formulae = names.len(), files = files.len(), "Staging formula files");
        stager.stage(&files)?;

        let exclusion = symlinks::default_exclusion(prefix);
        let inclusion = self.link_policy.inclusion(prefix);
        let links: Vec<PathBuf> = symlinks::resolve(prefix, &exclusion, inclusion.as_ref())?
            .into_iter()
            .map(|l| l.source_path)
            .collect();
        info!(links = links.len(), policy = %self.link_policy, "Staging symlinks");
        stager.stage(&links)?;

        let opt = opt_entries(prefix)?;
        info!(entries = opt.len(), "Staging opt");
        stager.stage(&opt)?;

        let root = payload_root(&self.staging_root, prefix);
        fs::create_dir_all(&root).map_err(|e| StewError::fs(&root, e))?;
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("stew", Strategy::Additive, "2024.01.02"),
            "stew_additive-2024.01.02.pkg"
        );
        assert_eq!(
            artifact_file_name("stew", Strategy::Subtractive, "1.0"),
            "stew_subtractive-1.0.pkg"
        );
    }

    #[test]
    fn test_default_version_format() {
        let version = default_version();
        let parts: Vec<&str> = version.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 2);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_strategy_round_trip_names() {
        assert_eq!("additive".parse::<Strategy>().unwrap(), Strategy::Additive);
        assert_eq!("Subtractive".parse::<Strategy>().unwrap(), Strategy::Subtractive);
        assert!("both".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Additive.to_string(), "additive");
    }
}
