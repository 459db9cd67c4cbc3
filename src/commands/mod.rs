//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `run` - Full pipeline: cleanroom, install, test, build, report
//! - `build` - Build a package from the current prefix
//! - `report` - Write the provenance report
//! - `preflight` - Run preflight checks
//! - `show` - Display information
//! - `clean` - Remove the staging root

pub mod build;
pub mod clean;
mod preflight;
pub mod report;
pub mod run;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use preflight::cmd_preflight;
pub use report::cmd_report;
pub use run::cmd_run;
pub use show::cmd_show;

use std::path::Path;

use anyhow::{Context, Result};
use stew::brew::Brew;
use stew::config::Config;
use stew::inventory::{load_formula_list, Inventory};

/// Read the formula list and take an inventory snapshot.
fn snapshot(config: &Config, list: &Path) -> Result<(Brew, Inventory)> {
    let brew = Brew::new(&config.brew_bin);
    let desired = load_formula_list(list)?;
    let inventory = Inventory::snapshot(&brew, desired).context("Failed to query brew")?;
    for warning in &inventory.warnings {
        println!("  [WARN] {}", warning);
    }
    Ok((brew, inventory))
}
