//! Persisted regctl configuration.
//!
//! The file lives at `$REGCTL_CONFIG` or `~/.regctl/config.json` and is
//! plain JSON:
//!
//! ```json
//! {
//!   "hosts": {
//!     "registry.example.com": { "user": "ci", "pass": "...", "tls": "insecure" }
//!   },
//!   "incDockerCred": false
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use regclient::{ConfigHost, TlsConf};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "REGCTL_CONFIG";

const CONFIG_DIR: &str = ".regctl";
const CONFIG_FILENAME: &str = "config.json";

/// Errors reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("Config file not found: {path}")]
    NotFound {
        /// Expected location.
        path: PathBuf,
    },

    /// The config file could not be read or written.
    #[error("File I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The config could not be serialized.
    #[error("Failed to serialize config: {source}")]
    Serialize {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Neither `REGCTL_CONFIG` nor a home directory is available.
    #[error("Cannot locate config file: REGCTL_CONFIG is not set and no home directory was found")]
    NoLocation,
}

/// Settings for one registry host as stored on disk.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password or token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,

    /// TLS mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConf>,

    /// Explicit protocol scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// PEM encoded certificate to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regcert: Option<String>,
}

impl HostEntry {
    /// Converts the entry into a client host record named `name`.
    #[must_use]
    pub fn to_config_host(&self, name: &str) -> ConfigHost {
        ConfigHost {
            name: name.to_string(),
            user: self.user.clone(),
            pass: self.pass.clone(),
            tls: self.tls,
            scheme: self.scheme.clone(),
            reg_cert: self.regcert.clone(),
        }
    }
}

impl fmt::Debug for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEntry")
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .field("scheme", &self.scheme)
            .field("regcert", &self.regcert.as_ref().map(|_| "<pem>"))
            .finish()
    }
}

/// The persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Where the config was loaded from, and where [`Config::save`] writes.
    #[serde(skip)]
    pub filename: Option<PathBuf>,

    /// Per-host settings keyed by host name.
    #[serde(default)]
    pub hosts: BTreeMap<String, HostEntry>,

    /// Include Docker CLI credentials. Unset means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inc_docker_cred: Option<bool>,

    /// Include Docker `certs.d` certificates. Unset means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inc_docker_cert: Option<bool>,
}

/// Returns the config file location.
///
/// # Errors
///
/// Returns [`ConfigError::NoLocation`] if `REGCTL_CONFIG` is unset and the
/// home directory is unknown.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILENAME))
        .ok_or(ConfigError::NoLocation)
}

impl Config {
    /// Loads the config from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let mut config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.filename = Some(path.to_path_buf());
        Ok(config)
    }

    /// Loads the config from its default location.
    ///
    /// # Errors
    ///
    /// See [`default_path`] and [`Config::load`].
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&default_path()?)
    }

    /// Loads the config from `path`, starting empty if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_new(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound { .. }) => Ok(Self {
                filename: Some(path.to_path_buf()),
                ..Self::default()
            }),
            other => other,
        }
    }

    /// Writes the config back to its file, creating parent directories.
    ///
    /// On unix the file is readable by its owner only, since it may hold
    /// passwords.
    ///
    /// # Errors
    ///
    /// Returns an error if the location is unknown or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = match self.filename {
            Some(ref path) => path.clone(),
            None => default_path()?,
        };
        let io_err = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize { source: e })?;
        content.push('\n');

        // The temp file is created 0600 and renamed over the target, so
        // passwords are never written to a more permissive file.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&path).map_err(|e| io_err(e.error))?;

        Ok(())
    }

    /// Returns a copy safe for display, with passwords masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let hosts = self
            .hosts
            .iter()
            .map(|(name, entry)| {
                let entry = HostEntry {
                    pass: entry.pass.as_ref().map(|_| "***".to_string()),
                    ..entry.clone()
                };
                (name.clone(), entry)
            })
            .collect();
        Self {
            hosts,
            ..self.clone()
        }
    }
}

/// Source of the persisted configuration.
pub trait ConfigLoader {
    /// Loads a fresh copy of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read.
    fn load(&self) -> Result<Config, ConfigError>;
}

impl<F> ConfigLoader for F
where
    F: Fn() -> Result<Config, ConfigError>,
{
    fn load(&self) -> Result<Config, ConfigError> {
        self()
    }
}

/// Loads the config file from disk on every call.
#[derive(Debug, Clone, Default)]
pub struct FileConfigLoader {
    path: Option<PathBuf>,
}

impl FileConfigLoader {
    /// Creates a loader for an explicit file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        match self.path {
            Some(ref path) => Config::load(path),
            None => Config::load_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "hosts": {
                    "reg.example.com": {"user": "a", "pass": "b", "tls": "insecure", "regcert": "PEM"}
                },
                "incDockerCred": false
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.filename.as_deref(), Some(path.as_path()));
        assert_eq!(config.inc_docker_cred, Some(false));
        assert_eq!(config.inc_docker_cert, None);

        let host = &config.hosts["reg.example.com"];
        assert_eq!(host.user.as_deref(), Some("a"));
        assert_eq!(host.tls, Some(TlsConf::Insecure));
        assert_eq!(host.regcert.as_deref(), Some("PEM"));
    }

    #[test]
    fn test_load_empty_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.hosts.is_empty());
        assert!(config.inc_docker_cred.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"incDockerCred": "maybe"}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_or_new_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::load_or_new(&path).unwrap();
        assert_eq!(config.filename.as_deref(), Some(path.as_path()));
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn test_load_or_new_keeps_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Config::load_or_new(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::load_or_new(&path).unwrap();
        config.inc_docker_cert = Some(false);
        config.hosts.insert(
            "reg.example.com".to_string(),
            HostEntry {
                user: Some("a".to_string()),
                ..HostEntry::default()
            },
        );
        config.save().unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_save_omits_unset_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::load_or_new(&path).unwrap();
        config.save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("incDockerCred"));
        assert!(!content.contains("incDockerCert"));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        Config::load_or_new(&path).unwrap().save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut config = Config::load(&path).unwrap();
        config.hosts.insert(
            "reg.example.com".to_string(),
            HostEntry {
                pass: Some("hunter2".to_string()),
                ..HostEntry::default()
            },
        );
        config.save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(Config::load(&path).unwrap().hosts.len(), 1);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_redacted_masks_passwords() {
        let mut config = Config::default();
        config.hosts.insert(
            "reg.example.com".to_string(),
            HostEntry {
                user: Some("a".to_string()),
                pass: Some("hunter2".to_string()),
                ..HostEntry::default()
            },
        );

        let shown = config.redacted();
        assert_eq!(shown.hosts["reg.example.com"].pass.as_deref(), Some("***"));
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_to_config_host() {
        let entry = HostEntry {
            user: Some("a".to_string()),
            pass: Some("b".to_string()),
            scheme: Some("http".to_string()),
            ..HostEntry::default()
        };
        let host = entry.to_config_host("reg.example.com");
        assert_eq!(host.name, "reg.example.com");
        assert_eq!(host.user.as_deref(), Some("a"));
        assert_eq!(host.scheme.as_deref(), Some("http"));
        assert!(host.tls.is_none());
    }

    #[test]
    fn test_file_loader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"incDockerCert": true}"#).unwrap();

        let config = FileConfigLoader::new(&path).load().unwrap();
        assert_eq!(config.inc_docker_cert, Some(true));
    }
}
