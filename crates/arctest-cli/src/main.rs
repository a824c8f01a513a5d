//! arctest CLI tool.
//!
//! Usage:
//! ```bash
//! arctest check [--project DIR] [--config PATH] [--format text|json|compact]
//! arctest init [--force]
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Architecture conformance checks for Go projects
#[derive(Parser)]
#[command(name = "arctest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ARCTEST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a Go project against its architecture rules
    Check {
        /// Project root to analyze
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a starter .arctest.yml into the current directory
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One line per violation.
    Compact,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { project, format } => {
            let passed =
                commands::check::run(&project, format, cli.config.as_deref(), cli.verbose)?;
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Init { force } => {
            commands::init::run(std::path::Path::new("."), force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
