//! Host tool availability checks.

use std::path::Path;

use crate::config::Config;
use crate::process;

use super::types::CheckResult;

/// Check the external tools a run depends on.
pub fn check_host_tools(config: &Config) -> Vec<CheckResult> {
    let required = [
        ("brew", config.brew_bin.as_path(), "Required to install and query formulae"),
        ("rsync", config.rsync_bin.as_path(), "Required to stage additive builds"),
        ("pkgbuild", config.pkgbuild_bin.as_path(), "Required to build the package"),
    ];
    let optional = [
        ("pkgutil", config.pkgutil_bin.as_path(), "Used to list the built payload"),
        (
            "forensics tool",
            config.forensics_bin.as_path(),
            "Without it the report has no binary records",
        ),
    ];

    let mut results = Vec::new();
    for (name, path, purpose) in required {
        results.push(check_tool(name, path, purpose, true));
    }
    for (name, path, purpose) in optional {
        results.push(check_tool(name, path, purpose, false));
    }
    results
}

fn check_tool(name: &str, path: &Path, purpose: &str, required: bool) -> CheckResult {
    match process::which(&path.to_string_lossy()) {
        Some(found) => CheckResult::pass_with(name, &found.display().to_string()),
        None => {
            let msg = format!("{} not found. {}", path.display(), purpose);
            if required {
                CheckResult::fail(name, &msg)
            } else {
                CheckResult::warn(name, &msg)
            }
        }
    }
}
