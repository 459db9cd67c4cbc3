//! Exclusion filters for subtractive packaging.
//!
//! `brew list --unbrewed` is the main source of filters, but it misses a few
//! things. Anything that slips past it ends up in the package; subtractive
//! builds are fast, not airtight.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Paths that `brew list --unbrewed` is known to miss.
pub const KNOWN_PROBLEM_PATHS: &[&str] = &[
    "bin/santactl",
    "bin/autopkg",
    "remotedesktop/RemoteDesktopChangeClientSettings.pkg",
    // exclude all of var to see what breaks
    "var",
    "Library",
];

/// Editor/VCS metadata plus brew's own core repos and binstub.
pub const BUILTIN_EXCLUSIONS: &[&str] = &[".DS_Store", ".git", "Homebrew", "bin/brew"];

/// Build the ordered filter list passed to pkgbuild.
///
/// Every unmanaged path is always present. Duplicates are harmless and not
/// removed across groups.
pub fn subtractive_filters(unmanaged: &BTreeSet<PathBuf>, extra: &[String]) -> Vec<String> {
    let mut filters: Vec<String> = unmanaged
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    filters.extend(KNOWN_PROBLEM_PATHS.iter().map(|s| s.to_string()));
    filters.extend(BUILTIN_EXCLUSIONS.iter().map(|s| s.to_string()));
    filters.extend(extra.iter().cloned());
    filters
}
