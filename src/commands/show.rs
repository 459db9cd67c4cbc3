//! Show command - displays information.

use anyhow::{bail, Result};
use std::path::PathBuf;

use stew::assemble::dump_payload;
use stew::config::Config;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// List the payload of a built package
    Payload { package: PathBuf },
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config => config.print(),
        ShowTarget::Payload { package } => {
            if !package.exists() {
                bail!("Package not found: {}. Run 'stew build' first.", package.display());
            }
            dump_payload(&config.pkgutil_bin, &package)?;
        }
    }
    Ok(())
}
