//! stew - Homebrew prefix packager.
//!
//! Installs a curated list of formulae, packages the result as a macOS
//! installer package and writes a provenance report for its binaries.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use stew::assemble::Strategy;
use stew::config::Config;

#[derive(Parser)]
#[command(name = "stew")]
#[command(about = "Package a Homebrew prefix and report on its binaries")]
#[command(
    after_help = "QUICK START:\n  stew preflight --list brews.txt  Check tools and config\n  stew run brews.txt               Install, package and report\n  stew show config                 Show configuration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Package the prefix in place, excluding unowned files
    Subtractive,
    /// Package a fresh staging tree with only formula files and links
    Additive,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Subtractive => Strategy::Subtractive,
            StrategyArg::Additive => Strategy::Additive,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: cleanroom, update, install, test, build, report
    Run {
        /// Formula list (one name per line, '#' comments)
        list: PathBuf,
        #[arg(long, value_enum, default_value = "additive")]
        strategy: StrategyArg,
        /// Package version (default: today's date, YYYY.MM.DD)
        #[arg(long)]
        version: Option<String>,
        /// Don't remove installed formulae first
        #[arg(long)]
        skip_cleanroom: bool,
        /// Don't run `brew test`
        #[arg(long)]
        skip_tests: bool,
    },

    /// Build a package from what is installed now
    Build {
        list: PathBuf,
        #[arg(long, value_enum, default_value = "additive")]
        strategy: StrategyArg,
        #[arg(long)]
        version: Option<String>,
    },

    /// Write report.json for the listed formulae
    Report { list: PathBuf },

    /// Run preflight checks
    Preflight {
        /// Also check this formula list
        #[arg(long)]
        list: Option<PathBuf>,
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Remove the staging root
    Clean,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// List the files in a built package
    Payload { package: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Commands::Run {
            list,
            strategy,
            version,
            skip_cleanroom,
            skip_tests,
        } => {
            let opts = commands::run::RunOptions {
                list,
                strategy: strategy.into(),
                version,
                skip_cleanroom,
                skip_tests,
            };
            commands::cmd_run(&config, opts)?;
        }

        Commands::Build {
            list,
            strategy,
            version,
        } => {
            commands::cmd_build(&config, &list, strategy.into(), version.as_deref())?;
        }

        Commands::Report { list } => {
            commands::cmd_report(&config, &list)?;
        }

        Commands::Preflight { list, strict } => {
            commands::cmd_preflight(&config, list.as_deref(), strict)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Payload { package } => commands::show::ShowTarget::Payload { package },
            };
            commands::cmd_show(&config, show_target)?;
        }

        Commands::Clean => {
            commands::cmd_clean(&config)?;
        }
    }

    Ok(())
}
