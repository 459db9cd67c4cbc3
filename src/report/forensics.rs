//! Binary forensics via an external tool (santactl by default).
//!
//! The tool's exit status can't be trusted: santactl exits 0 even for
//! "Invalid or empty file". Anything written to stderr means the result is
//! discarded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StewError};
use crate::process::Cmd;

/// Default location of the forensics tool.
pub const DEFAULT_FORENSICS_BIN: &str = "/usr/local/bin/santactl";

/// Arguments placed before the binary path.
pub const DEFAULT_FORENSICS_ARGS: &[&str] = &["fileinfo", "--json"];

/// One binary as described by the forensics tool.
///
/// `Path` and `SHA-256` are required; every other field is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "SHA-256")]
    pub sha256: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decide whether a forensics run can be trusted and parse it.
///
/// The tool exits zero on bad input, so any stderr output at all, even a
/// bare newline, marks the run as a diagnostic.
pub fn classify_output(binary: &Path, stdout: &str, stderr: &str) -> Result<ForensicRecord> {
    if !stderr.is_empty() {
        return Err(StewError::ForensicToolDiagnostic {
            path: binary.to_path_buf(),
            diagnostic: stderr.trim().to_string(),
        });
    }

    serde_json::from_str(stdout)
        .map_err(|e| StewError::parse(format!("forensics for {}", binary.display()), e))
}

/// Wrapper around the forensics tool.
#[derive(Debug, Clone)]
pub struct Forensics {
    bin: PathBuf,
    args: Vec<String>,
}

impl Forensics {
    pub fn new(bin: impl AsRef<Path>) -> Self {
        Self {
            bin: bin.as_ref().to_path_buf(),
            args: DEFAULT_FORENSICS_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the arguments placed before the binary path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Inspect one binary.
    ///
    /// Fails with `ToolUnavailable` if the tool can't be started,
    /// `ForensicToolDiagnostic` if it complained, `MetadataParse` if its
    /// output is unusable.
    pub fn inspect(&self, binary: &Path) -> Result<ForensicRecord> {
        let result = Cmd::from_path(&self.bin)
            .args(&self.args)
            .arg_path(binary)
            .allow_fail()
            .run()?;
        classify_output(binary, &result.stdout, &result.stderr)
    }
}
