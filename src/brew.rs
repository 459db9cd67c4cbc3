//! Thin client for the `brew` command line.
//!
//! Each method is one blocking invocation. Nothing here retries, and
//! nothing swallows failures; callers decide whether a failed install or
//! test is worth stopping for.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::process::{Cmd, CommandResult, EnvOverlay};

/// Default location of the brew binstub.
pub const DEFAULT_BREW_BIN: &str = "/usr/local/bin/brew";

/// Client for one brew installation.
#[derive(Debug, Clone)]
pub struct Brew {
    bin: PathBuf,
    env: EnvOverlay,
}

impl Brew {
    /// Create a client. Auto-update is always disabled for every invocation.
    pub fn new(bin: impl AsRef<Path>) -> Self {
        Self {
            bin: bin.as_ref().to_path_buf(),
            env: EnvOverlay::new().with("HOMEBREW_NO_AUTO_UPDATE", "1"),
        }
    }

    /// Add extra environment for every brew invocation made by this client.
    pub fn with_env(mut self, overlay: &EnvOverlay) -> Self {
        self.env = self.env.merge(overlay);
        self
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    pub fn env(&self) -> &EnvOverlay {
        &self.env
    }

    fn cmd(&self) -> Cmd {
        Cmd::from_path(&self.bin).env(&self.env)
    }

    fn run(&self, args: &[&str]) -> Result<CommandResult> {
        self.cmd()
            .args(args)
            .error_msg(format!("'brew {}' failed", args.join(" ")))
            .run()
    }

    fn run_interactive(&self, args: &[&str]) -> Result<()> {
        self.cmd()
            .args(args)
            .error_msg(format!("'brew {}' failed", args.join(" ")))
            .run_interactive()?;
        Ok(())
    }

    pub fn analytics_off(&self) -> Result<()> {
        self.run(&["analytics", "off"]).map(|_| ())
    }

    pub fn update(&self) -> Result<()> {
        self.run_interactive(&["update"])
    }

    pub fn install(&self, name: &str) -> Result<()> {
        info!(formula = name, "installing");
        self.run_interactive(&["install", name])
    }

    pub fn test(&self, name: &str) -> Result<()> {
        info!(formula = name, "testing");
        self.run_interactive(&["test", name])
    }

    /// Remove formulae. No-op for an empty list.
    pub fn remove(&self, names: &[String], ignore_dependencies: bool) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let mut args = vec!["rm", "--force"];
        if ignore_dependencies {
            args.push("--ignore-dependencies");
        }
        args.extend(names.iter().map(String::as_str));
        self.run_interactive(&args)
    }

    pub fn cleanup(&self) -> Result<()> {
        self.run_interactive(&["cleanup"])
    }

    /// Raw `brew info --json=v1 --installed` output.
    pub fn info_installed_json(&self) -> Result<String> {
        Ok(self.run(&["info", "--json=v1", "--installed"])?.stdout)
    }

    /// Paths under the prefix that no installed formula owns, relative to the prefix.
    pub fn list_unbrewed(&self) -> Result<Vec<PathBuf>> {
        let result = self.run(&["list", "--unbrewed"])?;
        Ok(result.stdout_lines().map(PathBuf::from).collect())
    }

    /// Every file installed by the given formulae, as absolute paths.
    ///
    /// Returns an empty list without calling brew when `names` is empty, since
    /// a bare `brew list --verbose` would describe every installed formula.
    pub fn list_files(&self, names: &[String]) -> Result<Vec<PathBuf>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = vec!["list", "--verbose"];
        args.extend(names.iter().map(String::as_str));
        let result = self.run(&args)?;
        Ok(result.stdout_lines().map(PathBuf::from).collect())
    }

    pub fn prefix(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.run(&["--prefix"])?.stdout_trimmed()))
    }

    pub fn cellar(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.run(&["--cellar"])?.stdout_trimmed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_update_disabled_by_default() {
        let brew = Brew::new(DEFAULT_BREW_BIN);
        assert_eq!(brew.env().get("HOMEBREW_NO_AUTO_UPDATE"), Some("1"));
    }

    #[test]
    fn test_extra_env_keeps_auto_update_override() {
        let extra = EnvOverlay::new().with("HOMEBREW_NO_ANALYTICS", "1");
        let brew = Brew::new(DEFAULT_BREW_BIN).with_env(&extra);
        assert_eq!(brew.env().get("HOMEBREW_NO_AUTO_UPDATE"), Some("1"));
        assert_eq!(brew.env().get("HOMEBREW_NO_ANALYTICS"), Some("1"));
    }

    #[test]
    fn test_empty_lists_do_not_invoke_brew() {
        let brew = Brew::new("/nonexistent/brew");
        assert!(brew.list_files(&[]).unwrap().is_empty());
        brew.remove(&[], true).unwrap();
    }

    #[test]
    fn test_missing_brew_is_reported() {
        let brew = Brew::new("/nonexistent/brew");
        assert!(brew.prefix().is_err());
    }
}
