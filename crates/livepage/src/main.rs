//! livepage CLI - live-reload client for static blogs.
//!
//! Provides commands for:
//! - `mirror`: Follow a page's live region and write it out on every update

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::MirrorArgs;
use output::Output;

/// livepage - live-reload client for static blogs.
#[derive(Parser)]
#[command(name = "livepage", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror a page's live region to stdout or a file.
    Mirror(MirrorArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Mirror(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match tokio::runtime::Runtime::new() {
        Ok(rt) => match cli.command {
            Commands::Mirror(args) => rt.block_on(args.execute()),
        },
        Err(err) => Err(err.into()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
