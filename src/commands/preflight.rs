//! Preflight command - runs preflight checks.

use anyhow::Result;
use std::path::Path;

use stew::config::Config;
use stew::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config, list: Option<&Path>, strict: bool) -> Result<()> {
    if strict {
        preflight::run_preflight_or_fail(config, list)?;
    } else {
        let report = preflight::run_preflight(config, list);
        report.print();
        if !report.all_passed() {
            println!("Some checks failed. Use --strict to fail the run.");
        }
    }
    Ok(())
}
