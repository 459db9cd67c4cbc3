//! Configuration management for stew.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assemble::{DEFAULT_PKGBUILD_BIN, DEFAULT_PKGUTIL_BIN, DEFAULT_RSYNC_BIN};
use crate::brew::DEFAULT_BREW_BIN;
use crate::report::DEFAULT_FORENSICS_BIN;
use crate::symlinks::LinkPolicyKind;

/// Default pkgbuild `--install-location`.
pub const DEFAULT_INSTALL_LOCATION: &str = "/usr/local";

/// Default package file base name.
pub const DEFAULT_PKG_NAME: &str = "stew";

/// Default package identifier.
pub const DEFAULT_PKG_IDENTIFIER: &str = "com.brewstew";

/// Stew configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub brew_bin: PathBuf,
    pub rsync_bin: PathBuf,
    pub pkgbuild_bin: PathBuf,
    pub pkgutil_bin: PathBuf,
    pub forensics_bin: PathBuf,
    /// Passed to pkgbuild as `--install-location`.
    pub install_location: PathBuf,
    pub pkg_name: String,
    pub pkg_identifier: String,
    /// Scratch tree for additive builds (default: ~/Desktop/pkgroot)
    pub staging_root: PathBuf,
    /// Where packages and report.json are written.
    pub output_dir: PathBuf,
    /// Extra subtractive filters (STEW_EXTRA_FILTERS, comma separated)
    pub extra_filters: Vec<String>,
    pub link_policy: LinkPolicyKind,
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment.
    pub fn load() -> Self {
        let mut vars: HashMap<String, String> = HashMap::new();

        // dotenvy::dotenv() would write into the process environment; read it instead
        if let Ok(iter) = dotenvy::dotenv_iter() {
            for (key, value) in iter.flatten() {
                vars.insert(key, value);
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            vars.insert(key, value);
        }

        Self::from_vars(&vars)
    }

    /// Build a config from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let path = |key: &str, default: &str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        let string = |key: &str, default: &str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let staging_root = vars
            .get("STEW_STAGING_ROOT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_staging_root);

        let extra_filters: Vec<String> = vars
            .get("STEW_EXTRA_FILTERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let link_policy = match vars.get("STEW_LINK_POLICY").map(|v| v.parse::<LinkPolicyKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                tracing::warn!("{}, using the default", e);
                LinkPolicyKind::default()
            }
            None => LinkPolicyKind::default(),
        };

        Self {
            brew_bin: path("STEW_BREW_BIN", DEFAULT_BREW_BIN),
            rsync_bin: path("STEW_RSYNC_BIN", DEFAULT_RSYNC_BIN),
            pkgbuild_bin: path("STEW_PKGBUILD_BIN", DEFAULT_PKGBUILD_BIN),
            pkgutil_bin: path("STEW_PKGUTIL_BIN", DEFAULT_PKGUTIL_BIN),
            forensics_bin: path("STEW_FORENSICS_BIN", DEFAULT_FORENSICS_BIN),
            install_location: path("STEW_INSTALL_LOCATION", DEFAULT_INSTALL_LOCATION),
            pkg_name: string("STEW_PKG_NAME", DEFAULT_PKG_NAME),
            pkg_identifier: string("STEW_PKG_IDENTIFIER", DEFAULT_PKG_IDENTIFIER),
            staging_root,
            output_dir: path("STEW_OUTPUT_DIR", "."),
            extra_filters,
            link_policy,
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        fn show(name: &str, value: &Path) {
            println!("  {}: {}", name, value.display());
        }

        println!("Configuration:");
        show("STEW_BREW_BIN", &self.brew_bin);
        show("STEW_RSYNC_BIN", &self.rsync_bin);
        show("STEW_PKGBUILD_BIN", &self.pkgbuild_bin);
        show("STEW_PKGUTIL_BIN", &self.pkgutil_bin);
        show("STEW_FORENSICS_BIN", &self.forensics_bin);
        show("STEW_INSTALL_LOCATION", &self.install_location);
        println!("  STEW_PKG_NAME: {}", self.pkg_name);
        println!("  STEW_PKG_IDENTIFIER: {}", self.pkg_identifier);
        show("STEW_STAGING_ROOT", &self.staging_root);
        show("STEW_OUTPUT_DIR", &self.output_dir);
        println!("  STEW_EXTRA_FILTERS: {}", self.extra_filters.join(","));
        println!("  STEW_LINK_POLICY: {}", self.link_policy);
    }
}

/// `~/Desktop/pkgroot`, or `./pkgroot` when there is no desktop directory.
fn default_staging_root() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Desktop")))
        .map(|d| d.join("pkgroot"))
        .unwrap_or_else(|| PathBuf::from("pkgroot"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new());
        assert_eq!(config.brew_bin, PathBuf::from("/usr/local/bin/brew"));
        assert_eq!(config.install_location, PathBuf::from("/usr/local"));
        assert_eq!(config.pkg_name, "stew");
        assert_eq!(config.pkg_identifier, "com.brewstew");
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.extra_filters.is_empty());
        assert_eq!(config.link_policy, LinkPolicyKind::Broad);
        assert!(config.staging_root.ends_with("pkgroot"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(&vars(&[
            ("STEW_BREW_BIN", "/opt/homebrew/bin/brew"),
            ("STEW_STAGING_ROOT", "/tmp/stage"),
            ("STEW_EXTRA_FILTERS", "share/doc, ,etc/private"),
            ("STEW_LINK_POLICY", "narrow"),
            ("STEW_PKG_NAME", "tools"),
        ]));
        assert_eq!(config.brew_bin, PathBuf::from("/opt/homebrew/bin/brew"));
        assert_eq!(config.staging_root, PathBuf::from("/tmp/stage"));
        assert_eq!(config.extra_filters, vec!["share/doc", "etc/private"]);
        assert_eq!(config.link_policy, LinkPolicyKind::Narrow);
        assert_eq!(config.pkg_name, "tools");
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = Config::from_vars(&vars(&[("STEW_RSYNC_BIN", ""), ("STEW_LINK_POLICY", "wide")]));
        assert_eq!(config.rsync_bin, PathBuf::from("/usr/bin/rsync"));
        assert_eq!(config.link_policy, LinkPolicyKind::Broad);
    }
}
