//! Report command - writes report.json.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use stew::config::Config;
use stew::inventory::Inventory;
use stew::report::{Forensics, Reporter};

/// Execute the report command.
pub fn cmd_report(config: &Config, list: &Path) -> Result<()> {
    println!("=== stew report ===\n");
    let (_, inventory) = super::snapshot(config, list)?;
    write_report(config, &inventory)?;
    Ok(())
}

/// Build and write the report for a snapshot.
pub fn write_report(config: &Config, inventory: &Inventory) -> Result<PathBuf> {
    let reporter = Reporter::new(Forensics::new(&config.forensics_bin));
    let report = reporter
        .build_inventory(inventory)
        .context("Failed to build provenance report")?;
    let path = report.write(&config.output_dir)?;

    println!(
        "\nReport: {} ({} formulae)",
        path.display(),
        report.formulae.len()
    );
    Ok(path)
}
