//! Discovery of credentials and certificates stored by the Docker CLI.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ConfigHost;
use crate::error::RegClientError;

/// Host name Docker Hub is stored under.
const DOCKER_HUB: &str = "docker.io";

/// Locations searched for Docker credentials and certificates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerPaths {
    /// Docker CLI `config.json`.
    pub config_file: Option<PathBuf>,

    /// `certs.d` style directories, lowest precedence first.
    pub cert_dirs: Vec<PathBuf>,
}

impl DockerPaths {
    /// Creates paths from explicit locations.
    #[must_use]
    pub const fn new(config_file: Option<PathBuf>, cert_dirs: Vec<PathBuf>) -> Self {
        Self {
            config_file,
            cert_dirs,
        }
    }

    /// Returns the locations the Docker CLI itself uses.
    ///
    /// `config.json` is read from `$DOCKER_CONFIG` when set, otherwise from
    /// `~/.docker`. Certificates come from `/etc/docker/certs.d` and then
    /// `~/.docker/certs.d`.
    #[must_use]
    pub fn from_env() -> Self {
        let home = dirs::home_dir();
        let config_dir = std::env::var_os("DOCKER_CONFIG")
            .map(PathBuf::from)
            .or_else(|| home.as_ref().map(|h| h.join(".docker")));

        let mut cert_dirs = vec![PathBuf::from("/etc/docker/certs.d")];
        if let Some(home) = home {
            cert_dirs.push(home.join(".docker").join("certs.d"));
        }

        Self {
            config_file: config_dir.map(|d| d.join("config.json")),
            cert_dirs,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfigFile {
    #[serde(default)]
    auths: BTreeMap<String, DockerAuth>,
    #[serde(default)]
    creds_store: Option<String>,
    #[serde(default)]
    cred_helpers: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerAuth {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Normalizes a Docker config key or registry reference to a host name.
///
/// Schemes and paths are stripped and the Docker Hub aliases collapse to
/// `docker.io`.
///
/// # Examples
///
/// ```
/// use regclient::normalize_hostname;
///
/// assert_eq!(normalize_hostname("https://index.docker.io/v1/"), "docker.io");
/// assert_eq!(normalize_hostname("http://localhost:5000/v2/"), "localhost:5000");
/// assert_eq!(normalize_hostname("ghcr.io"), "ghcr.io");
/// ```
#[must_use]
pub fn normalize_hostname(key: &str) -> String {
    let host = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    let host = host.split_once('/').map_or(host, |(h, _)| h);

    match host {
        "index.docker.io" | "registry-1.docker.io" => DOCKER_HUB.to_string(),
        _ => host.to_string(),
    }
}

/// Reads credentials from a Docker CLI `config.json`.
///
/// A missing file yields no hosts. Entries without usable credentials are
/// skipped with a warning; external credential helpers are not invoked.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_docker_credentials(path: &Path) -> Result<Vec<ConfigHost>, RegClientError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No Docker config found");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(RegClientError::IoError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let file: DockerConfigFile =
        serde_json::from_str(&content).map_err(|e| RegClientError::DockerConfig {
            path: path.to_path_buf(),
            source: e,
        })?;

    if let Some(ref store) = file.creds_store {
        debug!(store = %store, "Docker credential store is not supported, skipping");
    }
    for (host, helper) in &file.cred_helpers {
        debug!(host = %host, helper = %helper, "Docker credential helper is not supported, skipping");
    }

    let mut hosts: BTreeMap<String, ConfigHost> = BTreeMap::new();
    for (key, auth) in &file.auths {
        let name = normalize_hostname(key);
        match decode_auth(&name, auth) {
            Ok(Some((user, pass))) => {
                hosts.insert(name.clone(), ConfigHost::new(name).with_credentials(user, pass));
            }
            Ok(None) => {}
            Err(e) => warn!(err = %e, "Skipping Docker credentials"),
        }
    }

    debug!(path = %path.display(), count = hosts.len(), "Loaded Docker credentials");
    Ok(hosts.into_values().collect())
}

fn decode_auth(host: &str, auth: &DockerAuth) -> Result<Option<(String, String)>, RegClientError> {
    if let Some(encoded) = auth.auth.as_deref().filter(|a| !a.is_empty()) {
        let invalid = |message: String| RegClientError::InvalidDockerAuth {
            host: host.to_string(),
            message,
        };
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| invalid(format!("invalid base64: {e}")))?;
        let decoded = String::from_utf8(decoded).map_err(|e| invalid(format!("invalid utf-8: {e}")))?;
        let (user, pass) = decoded
            .split_once(':')
            .ok_or_else(|| invalid("expected user:password".to_string()))?;
        return Ok(Some((user.to_string(), pass.to_string())));
    }

    match (&auth.username, &auth.password) {
        (Some(user), Some(pass)) => Ok(Some((user.clone(), pass.clone()))),
        _ => Ok(None),
    }
}

/// Reads trusted certificates from a `certs.d` style directory.
///
/// Each subdirectory is named after a host. Every `*.crt` file in it is a
/// trusted CA; they are joined in file name order. Subdirectories without
/// a readable `*.crt` file are skipped, and a missing directory yields no
/// hosts.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn load_docker_certs(dir: &Path) -> Result<Vec<ConfigHost>, RegClientError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(RegClientError::IoError {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut hosts = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), err = %e, "Failed to read certificate directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if let Some(pem) = read_host_certs(&path) {
            hosts.push(ConfigHost::new(name).with_reg_cert(pem));
        }
    }

    hosts.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(dir = %dir.display(), count = hosts.len(), "Loaded Docker certificates");
    Ok(hosts)
}

/// Concatenates the `*.crt` files in one host directory, sorted by name.
fn read_host_certs(dir: &Path) -> Option<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), err = %e, "Failed to list registry certificates");
            return None;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "crt") && path.is_file())
        .collect();
    files.sort();

    let mut pem = String::new();
    for file in &files {
        match std::fs::read_to_string(file) {
            Ok(cert) => {
                pem.push_str(&cert);
                if !pem.ends_with('\n') {
                    pem.push('\n');
                }
            }
            Err(e) => {
                warn!(path = %file.display(), err = %e, "Failed to read registry certificate");
            }
        }
    }

    (!pem.is_empty()).then_some(pem)
}
