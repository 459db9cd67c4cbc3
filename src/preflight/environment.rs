//! Environment checks (install location, output and staging directories, formula list).

use std::fs;
use std::path::Path;

use crate::config::Config;

use super::types::CheckResult;

pub fn check_environment(config: &Config, formula_list: Option<&Path>) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if config.install_location.is_dir() {
        results.push(CheckResult::pass("install location"));
    } else {
        results.push(CheckResult::fail(
            "install location",
            &format!("{} does not exist", config.install_location.display()),
        ));
    }

    results.push(check_writable("output directory", &config.output_dir));

    // The staging root itself is recreated on every build; its parent must exist
    match config.staging_root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            results.push(CheckResult::warn(
                "staging root",
                &format!("{} will be created", parent.display()),
            ));
        }
        _ => results.push(CheckResult::pass_with(
            "staging root",
            &config.staging_root.display().to_string(),
        )),
    }

    if let Some(list) = formula_list {
        match fs::read_to_string(list) {
            Ok(content) => {
                let count = crate::inventory::parse_formula_list(&content).len();
                results.push(CheckResult::pass_with(
                    "formula list",
                    &format!("{} formulae", count),
                ));
            }
            Err(e) => results.push(CheckResult::fail(
                "formula list",
                &format!("Cannot read {}: {}", list.display(), e),
            )),
        }
    }

    results
}

fn check_writable(name: &str, dir: &Path) -> CheckResult {
    if let Err(e) = fs::create_dir_all(dir) {
        return CheckResult::fail(name, &format!("Cannot create {}: {}", dir.display(), e));
    }

    let test_file = dir.join(".stew-preflight-test");
    match fs::write(&test_file, "test") {
        Ok(_) => {
            let _ = fs::remove_file(&test_file);
            CheckResult::pass(name)
        }
        Err(e) => CheckResult::fail(name, &format!("Cannot write to {}: {}", dir.display(), e)),
    }
}
