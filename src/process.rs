//! Centralized command execution with consistent error handling.
//!
//! Every external tool (brew, rsync, pkgbuild, pkgutil, the forensics tool)
//! goes through [`Cmd`]. Environment changes are expressed as an
//! [`EnvOverlay`] that is applied to the single child process being spawned;
//! the process-wide environment is never touched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Result, StewError};

/// Immutable set of environment variables layered over the inherited environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this overlay with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut vars = self.vars.clone();
        vars.insert(key.into(), value.into());
        Self { vars }
    }

    /// Combine two overlays; values from `other` win.
    pub fn merge(&self, other: &EnvOverlay) -> Self {
        let mut vars = self.vars.clone();
        vars.extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Effective environment a child would see, given an inherited base.
    pub fn resolve<I, K, V>(&self, base: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env: BTreeMap<String, String> =
            base.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        env.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Add the overlay to a single command. The child still inherits everything else.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.envs(&self.vars);
    }
}

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }

    /// Non-empty stdout lines, in order.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().filter(|l| !l.trim().is_empty())
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    env: EnvOverlay,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            env: EnvOverlay::default(),
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Create a command builder for a program given by path.
    pub fn from_path(program: &Path) -> Self {
        Self::new(program.to_string_lossy())
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Layer an environment overlay over this invocation only.
    pub fn env(mut self, overlay: &EnvOverlay) -> Self {
        self.env = self.env.merge(overlay);
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// The command line as it would be displayed.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        self.env.apply(&mut cmd);
        cmd
    }

    fn failure(self, code: i32, stderr: String) -> StewError {
        let context = self
            .error_prefix
            .unwrap_or_else(|| format!("'{}' failed", self.program));
        StewError::ExternalToolFailure {
            tool: self.program,
            context,
            code,
            stderr,
        }
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        debug!(command = %self.display(), "running");

        let output = self
            .command()
            .output()
            .map_err(|source| StewError::ToolUnavailable {
                tool: self.program.clone(),
                source,
            })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            return Err(self.failure(result.code(), result.stderr.clone()));
        }

        Ok(result)
    }

    /// Run the command with inherited stdio (interactive/streaming).
    ///
    /// Output goes directly to the terminal. Use for tools whose progress the
    /// operator should see (brew install, pkgbuild).
    pub fn run_interactive(self) -> Result<ExitStatus> {
        debug!(command = %self.display(), "running interactively");

        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().map_err(|source| StewError::ToolUnavailable {
            tool: self.program.clone(),
            source,
        })?;

        if !self.allow_fail && !status.success() {
            return Err(self.failure(status.code().unwrap_or(-1), String::new()));
        }

        Ok(status)
    }
}

/// Check if a program exists.
///
/// Absolute or relative paths are checked directly; bare names are looked up
/// in PATH. Returns the full path if found.
pub fn which(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    which::which(program).ok()
}

/// Check if a program exists (bool version).
pub fn exists(program: &str) -> bool {
    which(program).is_some()
}
