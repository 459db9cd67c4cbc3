//! Provenance report: brew metadata joined with forensics for every binary.
//!
//! The report is best effort. Requested formulae that never made it into the
//! installed metadata are left out, and binaries the forensics tool couldn't
//! handle are skipped.

mod forensics;

use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::common::write_file_with_dirs;
use crate::error::{Result, StewError};
use crate::inventory::{InstalledFormula, Inventory};

pub use forensics::{
    classify_output, ForensicRecord, Forensics, DEFAULT_FORENSICS_ARGS, DEFAULT_FORENSICS_BIN,
};

/// File name of the written report.
pub const REPORT_FILE_NAME: &str = "report.json";

/// Everything known about one requested, installed formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub name: String,
    pub version: Option<String>,
    /// The formula's `brew info` entry, untouched.
    #[serde(rename = "brew_info")]
    pub package_metadata: Value,
    /// One record per executable, in path order.
    #[serde(rename = "santa_info")]
    pub binary_records: Vec<ForensicRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub formulae: Vec<ProvenanceRecord>,
}

impl Report {
    pub fn find(&self, name: &str) -> Option<&ProvenanceRecord> {
        self.formulae.iter().find(|f| f.name == name)
    }

    /// Pretty-print to `<output_dir>/report.json`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(REPORT_FILE_NAME);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StewError::parse("report serialization", e))?;
        write_file_with_dirs(&path, json)?;
        info!(path = %path.display(), formulae = self.formulae.len(), "Report written");
        Ok(path)
    }
}

/// Regular files with any execute bit, sorted by path. Links are not followed.
pub fn find_executables(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let mode = entry.metadata()?.permissions().mode();
        if mode & 0o111 != 0 {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Builds provenance reports.
#[derive(Debug, Clone)]
pub struct Reporter {
    forensics: Forensics,
}

impl Reporter {
    pub fn new(forensics: Forensics) -> Self {
        Self { forensics }
    }

    pub fn build_inventory(&self, inventory: &Inventory) -> Result<Report> {
        self.build_report(&inventory.desired, &inventory.installed, &inventory.cellar)
    }

    /// Join requested names with installed metadata and forensics.
    pub fn build_report(
        &self,
        requested: &[String],
        installed: &[InstalledFormula],
        cellar_root: &Path,
    ) -> Result<Report> {
        let mut report = Report::default();
        let mut seen = HashSet::new();

        for name in requested {
            if !seen.insert(name.as_str()) {
                continue;
            }

            let Some(entry) = installed.iter().find(|f| &f.formula.name == name) else {
                debug!(formula = %name, "no installed metadata, leaving out of report");
                continue;
            };

            let binary_records = self.inspect_formula(name, &cellar_root.join(name))?;
            report.formulae.push(ProvenanceRecord {
                name: name.clone(),
                version: entry.formula.installed_version.clone(),
                package_metadata: entry.metadata.clone(),
                binary_records,
            });
        }

        Ok(report)
    }

    fn inspect_formula(&self, name: &str, keg: &Path) -> Result<Vec<ForensicRecord>> {
        if !keg.is_dir() {
            warn!(formula = name, path = %keg.display(), "no Cellar directory, no binaries to inspect");
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for binary in find_executables(keg)? {
            match self.forensics.inspect(&binary) {
                Ok(record) => records.push(record),
                Err(e @ (StewError::ForensicToolDiagnostic { .. } | StewError::MetadataParse { .. })) => {
                    warn!("{} - forensics for this binary will be skipped", e);
                }
                Err(e) => return Err(e),
            }
        }
        info!(formula = name, binaries = records.len(), "Inspected");
        Ok(records)
    }
}
