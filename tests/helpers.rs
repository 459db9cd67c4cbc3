//! Shared test utilities for stew tests.
//!
//! Builds a fake Homebrew prefix in a temp dir and shell-script stand-ins for
//! brew, rsync, pkgbuild and the forensics tool.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};

use stew::config::Config;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Test environment with a fake prefix and tool directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Canonical temp root
    pub root: PathBuf,
    /// Fake brew prefix (`<root>/usr/local`)
    pub prefix: PathBuf,
    pub cellar: PathBuf,
    /// Where mock tools live
    pub tools: PathBuf,
    pub staging: PathBuf,
    pub output: PathBuf,
    /// Every mock brew invocation is appended here
    pub brew_log: PathBuf,
    /// Arguments of the last pkgbuild invocation
    pub pkgbuild_log: PathBuf,
    /// `brew info --json=v1 --installed` output served by the mock
    pub info_json: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temp dir");

        let prefix = root.join("usr/local");
        let cellar = prefix.join("Cellar");
        let tools = root.join("tools");
        fs::create_dir_all(&cellar).expect("Failed to create cellar");
        fs::create_dir_all(&tools).expect("Failed to create tools dir");

        Self {
            staging: root.join("pkgroot"),
            output: root.join("out"),
            brew_log: root.join("brew.log"),
            pkgbuild_log: root.join("pkgbuild.log"),
            info_json: root.join("info.json"),
            _temp_dir: temp_dir,
            root,
            prefix,
            cellar,
            tools,
        }
    }

    /// Environment with the standard prefix and every mock tool installed.
    pub fn with_mocks(info_json: &str) -> Self {
        let env = Self::new();
        create_mock_prefix(&env.prefix);
        fs::write(&env.info_json, info_json).expect("Failed to write info json");
        env.install_mock_brew();
        env.install_mock_rsync();
        env.install_mock_pkgbuild();
        env.install_mock_forensics();
        env
    }

    pub fn tool(&self, name: &str) -> PathBuf {
        self.tools.join(name)
    }

    pub fn install_mock_brew(&self) {
        let script = MOCK_BREW
            .replace("@LOG@", &self.brew_log.display().to_string())
            .replace("@PREFIX@", &self.prefix.display().to_string())
            .replace("@INFO@", &self.info_json.display().to_string());
        write_script(&self.tool("brew"), &script);
    }

    pub fn install_mock_rsync(&self) {
        write_script(&self.tool("rsync"), MOCK_RSYNC);
    }

    pub fn install_mock_pkgbuild(&self) {
        let script = MOCK_PKGBUILD.replace("@LOG@", &self.pkgbuild_log.display().to_string());
        write_script(&self.tool("pkgbuild"), &script);
    }

    pub fn install_mock_forensics(&self) {
        write_script(&self.tool("santactl"), MOCK_FORENSICS);
    }

    /// Config pointing every tool and directory at this environment.
    pub fn config(&self) -> Config {
        self.config_with(&[])
    }

    pub fn config_with(&self, extra: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = [
            ("STEW_BREW_BIN", self.tool("brew")),
            ("STEW_RSYNC_BIN", self.tool("rsync")),
            ("STEW_PKGBUILD_BIN", self.tool("pkgbuild")),
            ("STEW_PKGUTIL_BIN", self.tool("pkgutil")),
            ("STEW_FORENSICS_BIN", self.tool("santactl")),
            ("STEW_INSTALL_LOCATION", self.prefix.clone()),
            ("STEW_STAGING_ROOT", self.staging.clone()),
            ("STEW_OUTPUT_DIR", self.output.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.display().to_string()))
        .collect();

        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        Config::from_vars(&vars)
    }

    /// Where the prefix lands inside the staging root.
    pub fn staged_prefix(&self) -> PathBuf {
        self.staging.join(self.prefix.strip_prefix("/").unwrap())
    }

    pub fn brew_log(&self) -> String {
        fs::read_to_string(&self.brew_log).unwrap_or_default()
    }

    pub fn pkgbuild_args(&self) -> Vec<String> {
        fs::read_to_string(&self.pkgbuild_log)
            .expect("pkgbuild was not called")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Serves canned brew answers based on the fake prefix.
const MOCK_BREW: &str = r#"#!/bin/sh
echo "HOMEBREW_NO_AUTO_UPDATE=$HOMEBREW_NO_AUTO_UPDATE $*" >> "@LOG@"
case "$1" in
  --prefix) echo "@PREFIX@" ;;
  --cellar) echo "@PREFIX@/Cellar" ;;
  info) cat "@INFO@" ;;
  list)
    case "$2" in
      --unbrewed) echo "bin/custom" ;;
      --verbose)
        shift 2
        for f in "$@"; do
          if [ ! -d "@PREFIX@/Cellar/$f" ]; then
            echo "Error: No such keg: $f" >&2
            exit 1
          fi
          find "@PREFIX@/Cellar/$f" -type f -o -type l
        done ;;
    esac ;;
  *) ;;
esac
"#;

/// Minimal `rsync -a --files-from LIST / DEST`: copies each path, keeping links.
const MOCK_RSYNC: &str = r#"#!/bin/sh
list=""
while [ $# -gt 0 ]; do
  case "$1" in
    --files-from) list="$2"; shift 2 ;;
    -*) shift ;;
    *) break ;;
  esac
done
src="$1"
dest="$2"
while IFS= read -r p; do
  [ -z "$p" ] && continue
  rel=$(printf '%s' "$p" | sed 's|^/*||')
  mkdir -p "$dest/$(dirname "$rel")"
  if [ -L "$dest/$rel" ]; then rm -f "$dest/$rel"; fi
  cp -a "$src/$rel" "$dest/$rel" || exit 23
done < "$list"
"#;

/// Records its arguments and writes a placeholder package to the last one.
const MOCK_PKGBUILD: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "@LOG@"
for last; do :; done
printf 'pkg\n' > "$last"
"#;

/// Complains on stderr (exit 0) for any path containing "bad".
const MOCK_FORENSICS: &str = r#"#!/bin/sh
for last; do :; done
case "$last" in
  *bad*) echo "Invalid or empty file" >&2 ;;
  *) printf '{"Path": "%s", "SHA-256": "deadbeef", "Type": "Executable"}\n' "$last" ;;
esac
exit 0
"#;

/// `brew info` JSON for git 1.0 and jq 2.0.
pub const GIT_JQ_INFO: &str = r#"[
  {"name": "git", "installed": [{"version": "1.0"}], "desc": "Distributed revision control system"},
  {"name": "jq", "installed": [{"version": "2.0"}], "desc": "Lightweight and flexible command-line JSON processor"}
]"#;

pub fn write_script(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write mock script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod mock script");
}

fn write_file(path: &Path, content: &str, mode: u32) {
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent dir");
    fs::write(path, content).expect("Failed to write file");
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("Failed to chmod");
}

fn link(target: &str, at: &Path) {
    fs::create_dir_all(at.parent().unwrap()).expect("Failed to create parent dir");
    symlink(target, at).expect("Failed to create symlink");
}

/// Create a prefix with two kegs (git 1.0, jq 2.0) and an assortment of links.
///
/// ```text
/// Cellar/git/1.0/bin/git             exec
/// Cellar/git/1.0/share/doc/README
/// Cellar/jq/2.0/bin/jq               exec
/// Cellar/jq/2.0/bin/bad-helper       exec, forensics complains
/// Cellar/jq/2.0/lib/libjq.a
/// bin/git  -> Cellar                 staged
/// bin/jq   -> Cellar                 staged
/// bin/npm  -> lib/node_modules/...   staged with the broad policy only
/// bin/brew -> Homebrew/bin/brew      excluded
/// bin/custom                         unbrewed file
/// Homebrew/Library/linked -> Cellar  excluded (inside brew's repo)
/// opt/git, opt/jq -> Cellar kegs     staged
/// opt/orphan -> missing keg          staged only through opt
/// share/stale -> missing keg         dangling, skipped
/// etc/outside -> /etc                outside every policy
/// ```
pub fn create_mock_prefix(prefix: &Path) {
    write_file(&prefix.join("Cellar/git/1.0/bin/git"), "#!/bin/sh\n", 0o755);
    write_file(&prefix.join("Cellar/git/1.0/share/doc/README"), "git\n", 0o644);
    write_file(&prefix.join("Cellar/jq/2.0/bin/jq"), "#!/bin/sh\n", 0o755);
    write_file(&prefix.join("Cellar/jq/2.0/bin/bad-helper"), "", 0o755);
    write_file(&prefix.join("Cellar/jq/2.0/lib/libjq.a"), "ar\n", 0o644);
    write_file(&prefix.join("lib/node_modules/npm/bin/npm-cli.js"), "//\n", 0o755);
    write_file(&prefix.join("Homebrew/bin/brew"), "#!/bin/sh\n", 0o755);
    write_file(&prefix.join("bin/custom"), "#!/bin/sh\n", 0o755);

    link("../Cellar/git/1.0/bin/git", &prefix.join("bin/git"));
    link("../Cellar/jq/2.0/bin/jq", &prefix.join("bin/jq"));
    link("../lib/node_modules/npm/bin/npm-cli.js", &prefix.join("bin/npm"));
    link("../Homebrew/bin/brew", &prefix.join("bin/brew"));
    link("../../Cellar/git/1.0/bin/git", &prefix.join("Homebrew/Library/linked"));
    link("../Cellar/git/1.0", &prefix.join("opt/git"));
    link("../Cellar/jq/2.0", &prefix.join("opt/jq"));
    link("../Cellar/orphan/0.1", &prefix.join("opt/orphan"));
    link("../Cellar/removed/1.0/bin/gone", &prefix.join("share/stale"));
    link("/etc", &prefix.join("etc/outside"));
}

/// Every file and symlink under `root`, relative to it. Directories are omitted.
pub fn relative_entries(root: &Path) -> BTreeSet<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .map(|e| e.expect("walk failed"))
        .filter(|e| !e.file_type().is_dir())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

pub fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

/// Assert that a symlink exists and points to the expected target.
pub fn assert_symlink(path: &Path, expected_target: &str) {
    assert!(
        path.is_symlink(),
        "Expected symlink at {}, but it's not a symlink",
        path.display()
    );

    let target = fs::read_link(path).expect("Failed to read symlink");
    assert_eq!(
        target.to_string_lossy(),
        expected_target,
        "Symlink {} points to {:?}, expected {}",
        path.display(),
        target,
        expected_target
    );
}
