//! Formula inventory: what the operator asked for and what brew reports.
//!
//! An [`Inventory`] is a snapshot. It is built once from brew queries and
//! never re-queried; packaging and reporting both read from the same
//! snapshot.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::brew::Brew;
use crate::error::{Result, StewError};

/// Lines starting with this marker are comments in a formula list.
pub const COMMENT_MARKER: char = '#';

/// One managed package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Formula {
    pub name: String,
    pub installed_version: Option<String>,
}

impl Formula {
    pub fn is_installed(&self) -> bool {
        self.installed_version.is_some()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.installed_version {
            Some(version) => write!(f, "{} {}", self.name, version),
            None => write!(f, "{} (not installed)", self.name),
        }
    }
}

/// A formula plus the metadata brew reported for it.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledFormula {
    pub formula: Formula,
    /// The full `brew info` entry, passed through untouched.
    pub metadata: Value,
}

/// Non-fatal anomalies found while taking the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryWarning {
    /// Brew reported more than one installed version; the first one was kept.
    MultipleVersions {
        formula: String,
        kept: String,
        reported: Vec<String>,
    },
}

impl fmt::Display for InventoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryWarning::MultipleVersions {
                formula,
                kept,
                reported,
            } => write!(
                f,
                "Formula {} has more than one version installed ({}), using {}",
                formula,
                reported.join(", "),
                kept
            ),
        }
    }
}

#[derive(Deserialize)]
struct InfoEntry {
    name: String,
    installed: Vec<InstallRecord>,
}

#[derive(Deserialize)]
struct InstallRecord {
    version: String,
}

/// Parsed `brew info --json=v1 --installed` output.
#[derive(Debug, Clone, Default)]
pub struct InstalledMetadata {
    pub formulae: Vec<InstalledFormula>,
    pub warnings: Vec<InventoryWarning>,
}

/// Read a formula list, skipping comments and blank lines.
///
/// Order is preserved and duplicates are kept.
pub fn load_formula_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| StewError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_formula_list(&content))
}

pub fn parse_formula_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(str::to_string)
        .collect()
}

/// Validate and parse installed metadata.
///
/// Each entry must have a `name` and an `installed` array of records with a
/// `version`. Everything else is kept verbatim in [`InstalledFormula::metadata`].
pub fn parse_installed(json: &str) -> Result<InstalledMetadata> {
    let raw: Vec<Value> =
        serde_json::from_str(json).map_err(|e| StewError::parse("brew info", e))?;

    let mut parsed = InstalledMetadata::default();
    for metadata in raw {
        let entry = InfoEntry::deserialize(&metadata).map_err(|e| StewError::parse("brew info", e))?;

        let versions: Vec<String> = entry.installed.into_iter().map(|r| r.version).collect();
        let installed_version = versions.first().cloned();

        if let (Some(kept), true) = (&installed_version, versions.len() > 1) {
            let warning = InventoryWarning::MultipleVersions {
                formula: entry.name.clone(),
                kept: kept.clone(),
                reported: versions.clone(),
            };
            warn!("{}", warning);
            parsed.warnings.push(warning);
        }

        parsed.formulae.push(InstalledFormula {
            formula: Formula {
                name: entry.name,
                installed_version,
            },
            metadata,
        });
    }

    Ok(parsed)
}

/// Snapshot of desired and installed state.
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Formula names from the list file, in file order.
    pub desired: Vec<String>,
    /// Every formula brew reports as present.
    pub installed: Vec<InstalledFormula>,
    /// Prefix-relative paths no formula owns.
    pub unmanaged: BTreeSet<PathBuf>,
    pub prefix: PathBuf,
    pub cellar: PathBuf,
    pub warnings: Vec<InventoryWarning>,
}

impl Inventory {
    /// Query brew once and build the snapshot.
    pub fn snapshot(brew: &Brew, desired: Vec<String>) -> Result<Self> {
        info!("Querying installed formulae...");
        let metadata = parse_installed(&brew.info_installed_json()?)?;

        info!("Querying unbrewed files...");
        let unmanaged = brew.list_unbrewed()?.into_iter().collect();

        let inventory = Self {
            desired,
            installed: metadata.formulae,
            unmanaged,
            prefix: brew.prefix()?,
            cellar: brew.cellar()?,
            warnings: metadata.warnings,
        };
        info!(
            installed = inventory.installed.len(),
            unmanaged = inventory.unmanaged.len(),
            prefix = %inventory.prefix.display(),
            "Inventory ready"
        );
        Ok(inventory)
    }

    /// Installed formulae, in the order brew reported them.
    pub fn installed_formulae(&self) -> Vec<Formula> {
        self.installed
            .iter()
            .filter(|f| f.formula.is_installed())
            .map(|f| f.formula.clone())
            .collect()
    }

    /// Names of installed formulae.
    pub fn installed_names(&self) -> Vec<String> {
        self.installed_formulae().into_iter().map(|f| f.name).collect()
    }

    pub fn find(&self, name: &str) -> Option<&InstalledFormula> {
        self.installed.iter().find(|f| f.formula.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_comments_are_skipped_and_order_kept() {
        let list = parse_formula_list("# comment\ngit\njq\n#jq\nwget\ngit\n");
        assert_eq!(list, vec!["git", "jq", "wget", "git"]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let list = parse_formula_list("git\n\n   \njq  \n");
        assert_eq!(list, vec!["git", "jq"]);
    }

    #[test]
    fn test_indented_comments_are_skipped() {
        let list = parse_formula_list("  # indented comment\n\t#tabbed\ngit\n");
        assert_eq!(list, vec!["git"]);
    }

    #[test]
    fn test_load_formula_list_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "# comment\ngit\njq\n").unwrap();

        let list = load_formula_list(file.path()).unwrap();
        assert_eq!(list, vec!["git", "jq"]);
    }

    #[test]
    fn test_unreadable_list() {
        let err = load_formula_list(Path::new("/nonexistent/brews.txt")).unwrap_err();
        assert!(matches!(err, StewError::SourceUnreadable { .. }));
    }

    #[test]
    fn test_parse_installed_single_version() {
        let json = r#"[{"name":"git","installed":[{"version":"1.0"}],"desc":"VCS"}]"#;
        let parsed = parse_installed(json).unwrap();

        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.formulae.len(), 1);
        let git = &parsed.formulae[0];
        assert_eq!(git.formula.installed_version.as_deref(), Some("1.0"));
        assert_eq!(git.metadata["desc"], "VCS");
    }

    #[test]
    fn test_multiple_versions_keep_first_and_warn() {
        let json = r#"[{"name":"jq","installed":[{"version":"2.0"},{"version":"1.6"}]}]"#;
        let parsed = parse_installed(json).unwrap();

        assert_eq!(parsed.formulae.len(), 1);
        assert_eq!(
            parsed.formulae[0].formula.installed_version.as_deref(),
            Some("2.0")
        );
        assert_eq!(
            parsed.warnings,
            vec![InventoryWarning::MultipleVersions {
                formula: "jq".to_string(),
                kept: "2.0".to_string(),
                reported: vec!["2.0".to_string(), "1.6".to_string()],
            }]
        );
        assert!(parsed.warnings[0].to_string().contains("jq"));
    }

    #[test]
    fn test_empty_installed_means_not_installed() {
        let json = r#"[{"name":"ghost","installed":[]}]"#;
        let parsed = parse_installed(json).unwrap();
        assert!(!parsed.formulae[0].formula.is_installed());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let err = parse_installed(r#"[{"name":"git"}]"#).unwrap_err();
        assert!(matches!(err, StewError::MetadataParse { .. }));

        let err = parse_installed("not json").unwrap_err();
        assert!(matches!(err, StewError::MetadataParse { .. }));
    }

    #[test]
    fn test_formula_display() {
        let f = Formula {
            name: "git".to_string(),
            installed_version: Some("1.0".to_string()),
        };
        assert_eq!(f.to_string(), "git 1.0");
    }
}
