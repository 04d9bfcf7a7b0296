//! Config command implementation.
//!
//! Shows and edits the top level settings of the config file.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use super::OutputFormat;
use crate::config::Config;
use crate::root::RootOpts;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the config file (passwords are masked)
    Get(GetArgs),

    /// Change Docker discovery settings
    Set(SetArgs),
}

/// Arguments for `config get`.
#[derive(Args)]
pub struct GetArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for `config set`.
#[derive(Args, Default)]
pub struct SetArgs {
    /// Include credentials stored by the Docker CLI
    #[arg(long, value_name = "BOOL", conflicts_with = "reset_docker_cred")]
    pub docker_cred: Option<bool>,

    /// Include certificates from Docker certs.d directories
    #[arg(long, value_name = "BOOL", conflicts_with = "reset_docker_cert")]
    pub docker_cert: Option<bool>,

    /// Return Docker credential discovery to its default
    #[arg(long)]
    pub reset_docker_cred: bool,

    /// Return Docker certificate discovery to its default
    #[arg(long)]
    pub reset_docker_cert: bool,
}

/// Runs the config command.
///
/// # Errors
///
/// Returns an error if the config file cannot be located, read, or saved.
pub fn run(args: &ConfigArgs, root: &RootOpts) -> Result<()> {
    let path = root.config_path()?;
    match args.command {
        ConfigCommand::Get(ref get) => run_get(get, &path),
        ConfigCommand::Set(ref set) => run_set(set, &path),
    }
}

fn run_get(args: &GetArgs, path: &Path) -> Result<()> {
    let config = Config::load_or_new(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
        OutputFormat::Text => print!("{}", render_text(&config, path)),
    }
    Ok(())
}

fn run_set(args: &SetArgs, path: &Path) -> Result<()> {
    let mut config = Config::load_or_new(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if !apply_set(&mut config, args) {
        println!("No changes requested");
        return Ok(());
    }

    config
        .save()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;
    info!(path = %path.display(), "Config updated");
    Ok(())
}

/// Applies `config set` flags. Returns true if any flag was given.
fn apply_set(config: &mut Config, args: &SetArgs) -> bool {
    let mut changed = false;

    if args.reset_docker_cred {
        config.inc_docker_cred = None;
        changed = true;
    } else if let Some(value) = args.docker_cred {
        config.inc_docker_cred = Some(value);
        changed = true;
    }

    if args.reset_docker_cert {
        config.inc_docker_cert = None;
        changed = true;
    } else if let Some(value) = args.docker_cert {
        config.inc_docker_cert = Some(value);
        changed = true;
    }

    changed
}

fn describe_flag(flag: Option<bool>) -> &'static str {
    match flag {
        None => "enabled (default)",
        Some(true) => "enabled",
        Some(false) => "disabled",
    }
}

fn render_text(config: &Config, path: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Config file:   {}", path.display());
    let _ = writeln!(out, "Docker creds:  {}", describe_flag(config.inc_docker_cred));
    let _ = writeln!(out, "Docker certs:  {}", describe_flag(config.inc_docker_cert));

    if config.hosts.is_empty() {
        let _ = writeln!(out, "Hosts:         (none)");
        return out;
    }

    let _ = writeln!(out, "Hosts:");
    for (name, host) in &config.hosts {
        let _ = write!(out, "  {name}");
        if let Some(ref user) = host.user {
            let _ = write!(out, " user={user}");
        }
        if host.pass.is_some() {
            let _ = write!(out, " pass=***");
        }
        if let Some(tls) = host.tls {
            let _ = write!(out, " tls={tls}");
        }
        if let Some(ref scheme) = host.scheme {
            let _ = write!(out, " scheme={scheme}");
        }
        if host.regcert.is_some() {
            let _ = write!(out, " regcert=yes");
        }
        out.push('\n');
    }
    out
}
