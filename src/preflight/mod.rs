//! Preflight checks for a stew run.
//!
//! Validates host tools and the environment before anything touches the
//! prefix. Run with `stew preflight` to check everything is ready.

mod environment;
mod host_tools;
mod types;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
///
/// `formula_list` is checked for readability when given.
pub fn run_preflight(config: &Config, formula_list: Option<&Path>) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools(config));

    println!("Checking environment...");
    checks.extend(environment::check_environment(config, formula_list));

    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config, formula_list: Option<&Path>) -> Result<()> {
    let report = run_preflight(config, formula_list);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
