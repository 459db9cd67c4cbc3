//! Symlink discovery for additive staging.
//!
//! Walks a tree without following links and keeps every symlink whose own
//! path passes the exclusion policy and whose canonical target passes the
//! inclusion policy. Results are a set: walk order is not part of the
//! contract.
//!
//! Links left behind by formulae that are no longer installed are not
//! detected here. If their target still resolves and matches the inclusion
//! policy, they are returned like any other link.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, StewError};

/// Predicate over a filesystem path.
pub trait LinkPolicy {
    fn matches(&self, path: &Path) -> bool;
}

impl<F> LinkPolicy for F
where
    F: Fn(&Path) -> bool,
{
    fn matches(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Matches paths against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexPolicy(Regex);

impl RegexPolicy {
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self(Regex::new(pattern)?))
    }
}

impl LinkPolicy for RegexPolicy {
    fn matches(&self, path: &Path) -> bool {
        self.0.is_match(&path.to_string_lossy())
    }
}

/// Matches paths containing a given path segment (e.g. `Cellar`).
#[derive(Debug, Clone)]
pub struct MarkerPolicy(String);

impl MarkerPolicy {
    pub fn new(segment: impl Into<String>) -> Self {
        Self(segment.into())
    }
}

impl LinkPolicy for MarkerPolicy {
    fn matches(&self, path: &Path) -> bool {
        path.components()
            .any(|c| c.as_os_str().to_string_lossy() == self.0)
    }
}

/// Matches `roots` themselves and anything beneath them.
#[derive(Debug, Clone)]
pub struct SubtreePolicy(Vec<PathBuf>);

impl SubtreePolicy {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self(roots)
    }
}

impl LinkPolicy for SubtreePolicy {
    fn matches(&self, path: &Path) -> bool {
        self.0.iter().any(|root| path.starts_with(root))
    }
}

/// Which inclusion preset to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicyKind {
    /// Only links resolving into the Cellar.
    Narrow,
    /// Cellar links plus links resolving under `<prefix>/lib`.
    #[default]
    Broad,
}

impl std::str::FromStr for LinkPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "narrow" => Ok(Self::Narrow),
            "broad" => Ok(Self::Broad),
            other => Err(format!("unknown link policy '{}' (expected narrow or broad)", other)),
        }
    }
}

impl std::fmt::Display for LinkPolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Narrow => write!(f, "narrow"),
            Self::Broad => write!(f, "broad"),
        }
    }
}

impl LinkPolicyKind {
    pub fn inclusion(self, prefix: &Path) -> Box<dyn LinkPolicy> {
        match self {
            Self::Narrow => Box::new(narrow_inclusion()),
            Self::Broad => Box::new(broad_inclusion(prefix)),
        }
    }
}

/// brew's own binstub and core repository.
pub fn default_exclusion(prefix: &Path) -> SubtreePolicy {
    SubtreePolicy::new(vec![prefix.join("bin/brew"), prefix.join("Homebrew")])
}

/// Targets inside the Cellar.
pub fn narrow_inclusion() -> MarkerPolicy {
    MarkerPolicy::new("Cellar")
}

/// Targets inside the Cellar or under `<prefix>/lib`.
///
/// Some links (npm's, for example) point into `lib/node_modules` rather than
/// the Cellar.
///
/// Targets are matched in canonical form, so `<prefix>/lib` is canonicalized
/// too.
pub fn broad_inclusion(prefix: &Path) -> impl LinkPolicy {
    let cellar = narrow_inclusion();
    let lib_dir = prefix.join("lib");
    let lib_dir = fs::canonicalize(&lib_dir)
        .or_else(|_| fs::canonicalize(prefix).map(|p| p.join("lib")))
        .unwrap_or(lib_dir);
    let lib = SubtreePolicy::new(vec![lib_dir]);
    move |path: &Path| cellar.matches(path) || lib.matches(path)
}

/// A symlink selected for staging.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymlinkEntry {
    /// Where the link lives.
    pub source_path: PathBuf,
    /// The link's target as stored (often relative).
    pub link_target: PathBuf,
    /// Canonical path the link resolves to.
    pub resolved_real_path: PathBuf,
}

/// Find every qualifying symlink under `root`.
pub fn resolve(
    root: &Path,
    exclusion: &dyn LinkPolicy,
    inclusion: &dyn LinkPolicy,
) -> Result<BTreeSet<SymlinkEntry>> {
    let mut links = BTreeSet::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !exclusion.matches(e.path()));

    for entry in walker {
        let entry = entry?;
        if !entry.path_is_symlink() {
            continue;
        }

        let source_path = entry.path().to_path_buf();
        let resolved_real_path = match fs::canonicalize(&source_path) {
            Ok(p) => p,
            Err(e) => {
                debug!(link = %source_path.display(), "skipping dangling link: {}", e);
                continue;
            }
        };

        if !inclusion.matches(&resolved_real_path) {
            continue;
        }

        let link_target =
            fs::read_link(&source_path).map_err(|e| StewError::fs(&source_path, e))?;
        debug!(
            "Got link '{}' --> '{}'",
            source_path.display(),
            link_target.display()
        );

        links.insert(SymlinkEntry {
            source_path,
            link_target,
            resolved_real_path,
        });
    }

    Ok(links)
}
