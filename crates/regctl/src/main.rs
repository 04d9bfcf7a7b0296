//! regctl - Command-line utility for accessing container registries.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use regclient::LogSink;
use tracing::debug;

mod client;
mod commands;
mod config;
mod root;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolve logging before any subcommand runs
    let mut sink = LogSink::default();
    cli.root.apply(&mut sink)?;
    sink.init().map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
    for opt in cli.root.ignored_logopts() {
        debug!(logopt = %opt, "Ignoring unknown log option");
    }
    let log = Arc::new(sink);

    match cli.command {
        Commands::Config(args) => commands::config::run(&args, &cli.root),
        Commands::Registry(args) => commands::registry::run(&args, &cli.root, &log),
        Commands::Version => {
            println!("regctl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
