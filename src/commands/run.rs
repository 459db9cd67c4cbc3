//! Run command - the full pipeline.
//!
//! cleanroom -> update -> install -> test -> snapshot -> build -> payload -> report

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;

use stew::assemble::{dump_payload, Strategy};
use stew::brew::Brew;
use stew::config::Config;
use stew::inventory::{load_formula_list, parse_installed, Inventory};
use stew::timing::Timer;

/// Options for the run command.
pub struct RunOptions {
    pub list: PathBuf,
    pub strategy: Strategy,
    pub version: Option<String>,
    /// Keep currently installed formulae instead of removing them first.
    pub skip_cleanroom: bool,
    pub skip_tests: bool,
}

/// Execute the run command.
pub fn cmd_run(config: &Config, opts: RunOptions) -> Result<()> {
    println!("=== stew run ===\n");
    let start = Instant::now();

    let desired = load_formula_list(&opts.list)?;
    println!("{} formulae requested", desired.len());

    let brew = Brew::new(&config.brew_bin);
    if let Err(e) = brew.analytics_off() {
        warn!("Could not turn analytics off: {}", e);
    }

    if !opts.skip_cleanroom {
        println!("\nCleaning the prefix...");
        cleanroom(&brew)?;
    }

    println!("\nUpdating brew...");
    if let Err(e) = brew.update() {
        warn!("brew update failed, continuing with current formulae: {}", e);
    }

    println!("\nInstalling formulae...");
    let t = Timer::start("Install");
    let failed_installs = for_each_formula(&desired, "install", |name| brew.install(name));
    t.finish();

    let failed_tests = if opts.skip_tests {
        Vec::new()
    } else {
        println!("\nTesting formulae...");
        for_each_formula(&desired, "test", |name| brew.test(name))
    };

    let inventory = Inventory::snapshot(&brew, desired).context("Failed to query brew")?;
    for warning in &inventory.warnings {
        println!("  [WARN] {}", warning);
    }

    println!();
    let artifact = super::build::build_package(
        config,
        brew,
        &inventory,
        opts.strategy,
        opts.version.as_deref(),
    )?;

    println!("\nPayload:");
    if let Err(e) = dump_payload(&config.pkgutil_bin, &artifact.path) {
        warn!("Could not list payload: {}", e);
    }

    super::report::write_report(config, &inventory)?;

    print_failures("install", &failed_installs);
    print_failures("test", &failed_tests);
    println!("\n=== Done in {:.1}s ===", start.elapsed().as_secs_f64());
    Ok(())
}

/// Remove every installed formula (ignoring dependencies), then `brew cleanup`.
fn cleanroom(brew: &Brew) -> Result<()> {
    let installed = parse_installed(&brew.info_installed_json()?)?;
    let names: Vec<String> = installed
        .formulae
        .into_iter()
        .map(|f| f.formula.name)
        .collect();

    if !names.is_empty() {
        println!("  Removing {} installed formulae", names.len());
        brew.remove(&names, true).context("Failed to remove installed formulae")?;
    }
    brew.cleanup().context("brew cleanup failed")?;
    Ok(())
}

/// Run a per-formula step for each name, logging failures and continuing.
///
/// Returns the names that failed.
fn for_each_formula<F>(names: &[String], what: &str, mut step: F) -> Vec<String>
where
    F: FnMut(&str) -> stew::Result<()>,
{
    let mut failed = Vec::new();
    for name in names {
        if let Err(e) = step(name) {
            warn!(formula = %name, "{} failed: {}", what, e);
            failed.push(name.clone());
        }
    }
    failed
}

fn print_failures(what: &str, failed: &[String]) {
    if !failed.is_empty() {
        println!("[WARN] {} failed for: {}", what, failed.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stew::StewError;

    #[test]
    fn test_failures_do_not_stop_the_loop() {
        let names: Vec<String> = ["git", "nope", "jq"].iter().map(|s| s.to_string()).collect();
        let mut seen = Vec::new();

        let failed = for_each_formula(&names, "install", |name| {
            seen.push(name.to_string());
            if name == "nope" {
                Err(StewError::parse("brew", "no such formula"))
            } else {
                Ok(())
            }
        });

        assert_eq!(seen, vec!["git", "nope", "jq"]);
        assert_eq!(failed, vec!["nope"]);
    }
}
