//! Registry command implementation.
//!
//! Manages per-host entries in the config file and shows the settings a
//! client resolves for each registry.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use regclient::{normalize_hostname, ConfigHost, LogSink, TlsConf};
use tracing::info;

use super::OutputFormat;
use crate::client::ClientResolver;
use crate::config::{Config, FileConfigLoader};
use crate::root::RootOpts;

/// Arguments for the registry command.
#[derive(Args)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

/// Registry subcommands.
#[derive(Subcommand)]
pub enum RegistryCommand {
    /// Show resolved settings for every known registry
    List(ListArgs),

    /// Create or update the settings for a registry
    Set(SetArgs),

    /// Remove the settings for a registry
    Unset(UnsetArgs),
}

/// Arguments for `registry list`.
#[derive(Args)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for `registry set`.
#[derive(Args, Default)]
pub struct SetArgs {
    /// Registry host name, optionally with a port
    pub host: String,

    /// Username
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password or token
    #[arg(short, long, env = "REGCTL_PASS", hide_env_values = true)]
    pub pass: Option<String>,

    /// TLS mode: enabled, disabled, insecure
    #[arg(long)]
    pub tls: Option<TlsConf>,

    /// Protocol scheme (http or https)
    #[arg(long)]
    pub scheme: Option<String>,

    /// PEM file with a certificate to trust for this registry
    #[arg(long, value_name = "FILE")]
    pub regcert: Option<PathBuf>,
}

/// Arguments for `registry unset`.
#[derive(Args)]
pub struct UnsetArgs {
    /// Registry host name
    pub host: String,
}

/// Runs the registry command.
///
/// # Errors
///
/// Returns an error if the config file cannot be updated or the client
/// cannot be constructed.
pub fn run(args: &RegistryArgs, root: &RootOpts, log: &Arc<LogSink>) -> Result<()> {
    match args.command {
        RegistryCommand::List(ref list) => run_list(list, root, log),
        RegistryCommand::Set(ref set) => run_set(set, &root.config_path()?),
        RegistryCommand::Unset(ref unset) => run_unset(unset, &root.config_path()?),
    }
}

fn run_list(args: &ListArgs, root: &RootOpts, log: &Arc<LogSink>) -> Result<()> {
    let loader = root
        .config
        .clone()
        .map_or_else(FileConfigLoader::default, FileConfigLoader::new);
    let client = ClientResolver::new(loader, Arc::clone(log))
        .build()
        .context("Failed to create registry client")?;
    let hosts: Vec<ConfigHost> = client.hosts().map(ConfigHost::redacted).collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hosts)?),
        OutputFormat::Text => {
            if hosts.is_empty() {
                println!("No registries configured");
            }
            for host in &hosts {
                println!("{}", describe_host(host));
            }
        }
    }
    Ok(())
}

fn run_set(args: &SetArgs, path: &Path) -> Result<()> {
    let reg_cert = match args.regcert {
        Some(ref file) => Some(
            std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read certificate {}", file.display()))?,
        ),
        None => None,
    };

    let mut config = Config::load_or_new(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let name = apply_set(&mut config, args, reg_cert)?;
    config
        .save()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    info!(host = %name, "Registry settings saved");
    Ok(())
}

fn run_unset(args: &UnsetArgs, path: &Path) -> Result<()> {
    let mut config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let name = apply_unset(&mut config, &args.host)?;
    config
        .save()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    info!(host = %name, "Registry settings removed");
    Ok(())
}

/// Merges the `registry set` flags into the entry for the host.
fn apply_set(config: &mut Config, args: &SetArgs, reg_cert: Option<String>) -> Result<String> {
    let name = normalize_hostname(args.host.trim());
    if name.is_empty() {
        anyhow::bail!("Registry host name must not be empty");
    }

    let entry = config.hosts.entry(name.clone()).or_default();
    if args.user.is_some() {
        entry.user.clone_from(&args.user);
    }
    if args.pass.is_some() {
        entry.pass.clone_from(&args.pass);
    }
    if args.tls.is_some() {
        entry.tls = args.tls;
    }
    if args.scheme.is_some() {
        entry.scheme.clone_from(&args.scheme);
    }
    if reg_cert.is_some() {
        entry.regcert = reg_cert;
    }
    Ok(name)
}

fn apply_unset(config: &mut Config, host: &str) -> Result<String> {
    let name = normalize_hostname(host.trim());
    if config.hosts.remove(&name).is_none() {
        anyhow::bail!("Registry {name} is not configured");
    }
    Ok(name)
}

fn describe_host(host: &ConfigHost) -> String {
    let mut line = format!("{} tls={}", host.name, host.tls());
    if let Some(ref user) = host.user {
        let _ = write!(line, " user={user}");
    }
    if let Some(ref scheme) = host.scheme {
        let _ = write!(line, " scheme={scheme}");
    }
    if host.reg_cert.is_some() {
        line.push_str(" regcert=yes");
    }
    line
}
