//! Command-line interface for splitpack
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `analyze`: Print the shared chunk plan for a module graph
//! - `relocate`: Move shared chunks of an emitted build into their subpackages

mod analyze;
mod relocate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::DEFAULT_CONFIG_FILE;

pub use analyze::AnalyzeCommand;
pub use relocate::RelocateCommand;

/// Splitpack - subpackage-aware shared chunk splitting for mini-program builds
#[derive(Parser, Debug)]
#[command(name = "splitpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to splitpack.toml config file
    #[arg(short, long, global = true, env = "SPLITPACK_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a module graph and print the shared chunk plan
    Analyze(AnalyzeCommand),

    /// Relocate shared chunks of an emitted build into their subpackages
    Relocate(RelocateCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Analyze(cmd) => cmd.execute(&self.config).await,
            Commands::Relocate(cmd) => cmd.execute(&self.config).await,
        }
    }
}

/// Print the splitpack banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "Splitpack".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
