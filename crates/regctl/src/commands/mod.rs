//! CLI commands and argument parsing.

pub mod config;
pub mod registry;

use clap::{Parser, Subcommand, ValueEnum};

use crate::root::RootOpts;

/// regctl - Utility for accessing container registries
#[derive(Parser)]
#[command(name = "regctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub root: RootOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the regctl configuration file
    Config(config::ConfigArgs),

    /// Manage per-registry settings
    Registry(registry::RegistryArgs),

    /// Print version information
    Version,
}

/// Output format for commands that print data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// Pretty printed JSON
    Json,
}
