//! Build command - packages the prefix.

use anyhow::{Context, Result};
use std::path::Path;

use stew::assemble::{Assembler, BuiltArtifact, Strategy};
use stew::config::Config;
use stew::inventory::Inventory;
use stew::brew::Brew;

/// Execute the build command.
pub fn cmd_build(
    config: &Config,
    list: &Path,
    strategy: Strategy,
    version: Option<&str>,
) -> Result<()> {
    println!("=== stew build ({}) ===\n", strategy);
    let (brew, inventory) = super::snapshot(config, list)?;
    build_package(config, brew, &inventory, strategy, version)?;
    Ok(())
}

/// Build from an existing snapshot and print where the package went.
pub fn build_package(
    config: &Config,
    brew: Brew,
    inventory: &Inventory,
    strategy: Strategy,
    version: Option<&str>,
) -> Result<BuiltArtifact> {
    let assembler = Assembler::from_config(config, brew);
    let artifact = assembler
        .build_inventory(inventory, strategy, version)
        .with_context(|| format!("{} build failed", strategy))?;

    println!("\nPackage: {}", artifact.path.display());
    println!("Checksum: {}", artifact.checksum_path.display());
    Ok(artifact)
}
