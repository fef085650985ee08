//! Splitpack - subpackage-aware shared chunk splitting for mini-program builds
//!
//! Modules that only subpackages import are grouped into shared chunks and
//! moved out of the main package, keeping the main package small.
//!
//! # Features
//! - Page reachability analysis over the host's module graph
//! - Deterministic shared chunk naming, hashed or readable
//! - Chunk relocation with require path rewriting
//! - Stylesheet import injection for relocated styles

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use splitpack_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("splitpack=debug,splitpack_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("splitpack=info,splitpack_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
