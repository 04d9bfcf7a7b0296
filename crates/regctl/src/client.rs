//! Builds registry clients from the persisted configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use regclient::{ConfigHost, DockerPaths, LogSink, Opt, RegClient, RegClientError};
use tracing::{debug, warn};

use crate::config::{Config, ConfigLoader, FileConfigLoader, HostEntry};

/// Resolves construction directives for each registry client a command needs.
///
/// Every call reloads the configuration, so a resolver can be reused for
/// any number of clients.
#[derive(Debug)]
pub struct ClientResolver<L = FileConfigLoader> {
    loader: L,
    log: Arc<LogSink>,
    docker_paths: DockerPaths,
}

impl<L: ConfigLoader> ClientResolver<L> {
    /// Creates a resolver using `loader` for the configuration.
    #[must_use]
    pub fn new(loader: L, log: Arc<LogSink>) -> Self {
        Self {
            loader,
            log,
            docker_paths: DockerPaths::from_env(),
        }
    }

    /// Loads the configuration, falling back to defaults on failure.
    pub fn load_config(&self) -> Config {
        match self.loader.load() {
            Ok(config) => {
                debug!(config = ?config, "Loaded default config");
                config
            }
            Err(e) => {
                warn!(err = %e, "Failed to load default config");
                Config::default()
            }
        }
    }

    /// Returns the construction directives for the current configuration.
    pub fn options(&self) -> Vec<Opt> {
        client_options(&self.load_config(), &self.log)
    }

    /// Builds a registry client for the current configuration.
    ///
    /// # Errors
    ///
    /// Returns the construction error unchanged.
    pub fn build(&self) -> Result<RegClient, RegClientError> {
        RegClient::with_docker_paths(self.options(), &self.docker_paths)
    }
}

/// Returns the directives for `config`, in a fixed order.
///
/// The log sink always comes first, then Docker credential discovery,
/// Docker certificate discovery, and the explicit hosts if there are any.
#[must_use]
pub fn client_options(config: &Config, log: &Arc<LogSink>) -> Vec<Opt> {
    let mut opts = vec![Opt::WithLog(Arc::clone(log))];

    if config.inc_docker_cred.unwrap_or(true) {
        opts.push(Opt::WithDockerCreds);
    }
    if config.inc_docker_cert.unwrap_or(true) {
        opts.push(Opt::WithDockerCerts);
    }

    let hosts = flatten_hosts(&config.hosts);
    if !hosts.is_empty() {
        opts.push(Opt::WithConfigHosts(hosts));
    }

    opts
}

/// Turns the host map into records sorted by host name.
#[must_use]
pub fn flatten_hosts(hosts: &BTreeMap<String, HostEntry>) -> Vec<ConfigHost> {
    hosts
        .iter()
        .map(|(name, entry)| entry.to_config_host(name))
        .collect()
}
