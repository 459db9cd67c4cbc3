//! Clean command - removes the staging root.

use anyhow::Result;

use stew::common::cleanup_work_dir;
use stew::config::Config;

/// Execute the clean command.
pub fn cmd_clean(config: &Config) -> Result<()> {
    let staging = &config.staging_root;
    if cleanup_work_dir(staging)? {
        println!("Removed {}", staging.display());
    } else {
        println!("Nothing to clean ({} does not exist).", staging.display());
    }
    Ok(())
}
