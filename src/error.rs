//! Classified failures for the stew library.
//!
//! Every fallible library operation returns [`Result`]. Callers match on the
//! variant to decide whether a failure ends the run (staging, packaging) or is
//! logged and skipped (per-formula install/test, a single forensics lookup).

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced by inventory, assembly and reporting.
#[derive(Error, Debug)]
pub enum StewError {
    /// The desired-formula list could not be read.
    #[error("Failed to read formula list '{}': {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external tool ran but exited non-zero.
    #[error("{context} (exit code {code}){}", format_stderr(stderr))]
    ExternalToolFailure {
        tool: String,
        context: String,
        code: i32,
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("Failed to execute '{tool}'. Is it installed?")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The forensics tool wrote diagnostics for a binary.
    #[error("Forensics tool reported a problem with {}: {diagnostic}", path.display())]
    ForensicToolDiagnostic { path: PathBuf, diagnostic: String },

    /// Structured output from an external tool did not match its schema.
    #[error("Unexpected output from {what}: {reason}")]
    MetadataParse { what: String, reason: String },

    /// Staging, walking or writing on the local filesystem failed.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr)
    }
}

impl StewError {
    /// Wrap an I/O error with the path it happened at.
    pub fn fs(path: impl AsRef<Path>, source: io::Error) -> Self {
        StewError::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        StewError::MetadataParse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of an external tool that actually ran.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, StewError::ExternalToolFailure { .. })
    }
}

impl From<walkdir::Error> for StewError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
        StewError::Filesystem { path, source }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, StewError>;
