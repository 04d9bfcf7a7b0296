//! Registry client assembly from construction directives.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ConfigHost;
use crate::docker::{self, normalize_hostname, DockerPaths};
use crate::error::RegClientError;
use crate::log::LogSink;

/// A single client construction directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Opt {
    /// Share the caller's log sink with the client.
    WithLog(Arc<LogSink>),

    /// Discover credentials stored by the Docker CLI.
    WithDockerCreds,

    /// Discover certificates stored in Docker `certs.d` directories.
    WithDockerCerts,

    /// Explicit per-host settings.
    WithConfigHosts(Vec<ConfigHost>),
}

#[derive(Debug, Default)]
struct ClientState {
    log: Option<Arc<LogSink>>,
    docker_creds: bool,
    docker_certs: bool,
    config_hosts: BTreeMap<String, ConfigHost>,
}

impl ClientState {
    fn apply(&mut self, opt: Opt) -> Result<(), RegClientError> {
        match opt {
            Opt::WithLog(log) => self.log = Some(log),
            Opt::WithDockerCreds => self.docker_creds = true,
            Opt::WithDockerCerts => self.docker_certs = true,
            Opt::WithConfigHosts(hosts) => {
                for mut host in hosts {
                    let raw = std::mem::take(&mut host.name);
                    host.name = normalize_hostname(raw.trim());
                    if host.name.is_empty() {
                        return Err(RegClientError::InvalidHost {
                            reason: format!("empty host name in {raw:?}"),
                        });
                    }
                    match self.config_hosts.entry(host.name.clone()) {
                        Entry::Occupied(mut existing) => {
                            warn!(
                                host = %host.name,
                                key = %raw,
                                "Host configured more than once, merging settings"
                            );
                            existing.get_mut().merge(&host);
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(host);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A registry client with its per-host settings resolved.
#[derive(Debug, Clone)]
pub struct RegClient {
    log: Arc<LogSink>,
    hosts: BTreeMap<String, ConfigHost>,
}

impl RegClient {
    /// Creates a client, discovering Docker settings in their usual locations.
    ///
    /// See [`RegClient::with_docker_paths`] for how directives are combined.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit host record is invalid.
    pub fn new(opts: impl IntoIterator<Item = Opt>) -> Result<Self, RegClientError> {
        Self::with_docker_paths(opts, &DockerPaths::from_env())
    }

    /// Creates a client, discovering Docker settings under `paths`.
    ///
    /// The order of directives does not matter. Hosts are layered in a fixed
    /// order: Docker credentials, then Docker certificates, then explicit
    /// hosts. An explicit host therefore wins over discovered settings for
    /// the same host, field by field. Unreadable Docker files are logged and
    /// skipped; they never fail construction.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit host name is empty once normalized.
    ///
    /// Explicit hosts whose names normalize to the same host (such as
    /// `index.docker.io` and `docker.io`) are merged in the order given, so
    /// the later record wins field by field.
    pub fn with_docker_paths(
        opts: impl IntoIterator<Item = Opt>,
        paths: &DockerPaths,
    ) -> Result<Self, RegClientError> {
        let mut state = ClientState::default();
        for opt in opts {
            state.apply(opt)?;
        }

        let mut hosts: BTreeMap<String, ConfigHost> = BTreeMap::new();

        if state.docker_creds {
            if let Some(ref file) = paths.config_file {
                match docker::load_docker_credentials(file) {
                    Ok(found) => layer(&mut hosts, found),
                    Err(e) => warn!(err = %e, "Failed to load Docker credentials"),
                }
            }
        }

        if state.docker_certs {
            for dir in &paths.cert_dirs {
                match docker::load_docker_certs(dir) {
                    Ok(found) => layer(&mut hosts, found),
                    Err(e) => warn!(err = %e, "Failed to load Docker certificates"),
                }
            }
        }

        for (name, host) in state.config_hosts {
            if hosts.contains_key(&name) {
                debug!(host = %name, "Explicit host settings override discovered settings");
            }
            layer(&mut hosts, [host]);
        }

        debug!(hosts = hosts.len(), "Registry client configured");

        Ok(Self {
            log: state.log.unwrap_or_default(),
            hosts,
        })
    }

    /// Returns the log sink the client was built with.
    #[must_use]
    pub fn log(&self) -> &LogSink {
        &self.log
    }

    /// Returns the settings for a host, if any.
    ///
    /// The name is normalized first, so `index.docker.io` finds `docker.io`.
    #[must_use]
    pub fn host(&self, name: &str) -> Option<&ConfigHost> {
        self.hosts.get(&normalize_hostname(name))
    }

    /// Returns all configured hosts, sorted by name.
    pub fn hosts(&self) -> impl Iterator<Item = &ConfigHost> {
        self.hosts.values()
    }
}

fn layer(hosts: &mut BTreeMap<String, ConfigHost>, found: impl IntoIterator<Item = ConfigHost>) {
    for host in found {
        hosts
            .entry(host.name.clone())
            .and_modify(|existing| existing.merge(&host))
            .or_insert(host);
    }
}
