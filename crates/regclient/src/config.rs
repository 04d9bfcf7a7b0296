//! Per-host registry settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TLS mode for a registry host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsConf {
    /// Verified TLS (default).
    #[default]
    Enabled,
    /// Plain HTTP.
    Disabled,
    /// TLS without certificate verification.
    Insecure,
}

impl TlsConf {
    /// Returns the lowercase name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Insecure => "insecure",
        }
    }
}

impl fmt::Display for TlsConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsConf {
    type Err = ParseTlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "insecure" => Ok(Self::Insecure),
            _ => Err(ParseTlsError {
                value: s.to_string(),
            }),
        }
    }
}

/// Error returned for an unknown TLS mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid tls setting: {value:?} (expected enabled, disabled or insecure)")]
pub struct ParseTlsError {
    /// The rejected input.
    pub value: String,
}

/// Settings for one registry host.
///
/// Every field except `name` is optional; an unset field means "no opinion"
/// so that records from several sources can be layered with [`merge`].
///
/// [`merge`]: ConfigHost::merge
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHost {
    /// Registry host name, optionally with a port.
    pub name: String,

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

    /// PEM encoded certificate to trust for this host.
    #[serde(default, rename = "regcert", skip_serializing_if = "Option::is_none")]
    pub reg_cert: Option<String>,
}

impl ConfigHost {
    /// Creates an empty record for the given host.
    ///
    /// # Examples
    ///
    /// ```
    /// use regclient::ConfigHost;
    ///
    /// let host = ConfigHost::new("registry.example.com");
    /// assert_eq!(host.name, "registry.example.com");
    /// assert!(host.user.is_none());
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets username and password.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.pass = Some(pass.into());
        self
    }

    /// Sets the TLS mode.
    #[must_use]
    pub const fn with_tls(mut self, tls: TlsConf) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Sets the protocol scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the trusted certificate.
    #[must_use]
    pub fn with_reg_cert(mut self, pem: impl Into<String>) -> Self {
        self.reg_cert = Some(pem.into());
        self
    }

    /// Returns the effective TLS mode.
    #[must_use]
    pub fn tls(&self) -> TlsConf {
        self.tls.unwrap_or_default()
    }

    /// Overlays every field that is set on `other` onto `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use regclient::{ConfigHost, TlsConf};
    ///
    /// let mut host = ConfigHost::new("r.example.com").with_credentials("a", "b");
    /// host.merge(&ConfigHost::new("r.example.com").with_tls(TlsConf::Insecure));
    ///
    /// assert_eq!(host.user.as_deref(), Some("a"));
    /// assert_eq!(host.tls, Some(TlsConf::Insecure));
    /// ```
    pub fn merge(&mut self, other: &Self) {
        if other.user.is_some() {
            self.user.clone_from(&other.user);
        }
        if other.pass.is_some() {
            self.pass.clone_from(&other.pass);
        }
        if other.tls.is_some() {
            self.tls = other.tls;
        }
        if other.scheme.is_some() {
            self.scheme.clone_from(&other.scheme);
        }
        if other.reg_cert.is_some() {
            self.reg_cert.clone_from(&other.reg_cert);
        }
    }

    /// Returns a copy safe for display, with the password masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            pass: self.pass.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ConfigHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHost")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .field("scheme", &self.scheme)
            .field("reg_cert", &self.reg_cert.as_ref().map(|_| "<pem>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_parse() {
        assert_eq!("enabled".parse::<TlsConf>(), Ok(TlsConf::Enabled));
        assert_eq!("Disabled".parse::<TlsConf>(), Ok(TlsConf::Disabled));
        assert_eq!("insecure".parse::<TlsConf>(), Ok(TlsConf::Insecure));
        assert!("skip".parse::<TlsConf>().is_err());
    }

    #[test]
    fn test_tls_serde_lowercase() {
        let json = serde_json::to_string(&TlsConf::Insecure).unwrap();
        assert_eq!(json, "\"insecure\"");
        let tls: TlsConf = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(tls, TlsConf::Disabled);
    }

    #[test]
    fn test_tls_default_when_unset() {
        let host = ConfigHost::new("r.example.com");
        assert_eq!(host.tls(), TlsConf::Enabled);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut host = ConfigHost::new("r.example.com")
            .with_credentials("alice", "pw")
            .with_reg_cert("PEM");
        host.merge(&ConfigHost::new("r.example.com").with_scheme("http"));

        assert_eq!(host.user.as_deref(), Some("alice"));
        assert_eq!(host.pass.as_deref(), Some("pw"));
        assert_eq!(host.reg_cert.as_deref(), Some("PEM"));
        assert_eq!(host.scheme.as_deref(), Some("http"));
    }

    #[test]
    fn test_merge_overrides_set_fields() {
        let mut host = ConfigHost::new("r.example.com").with_credentials("alice", "pw");
        host.merge(&ConfigHost::new("r.example.com").with_credentials("bob", "other"));

        assert_eq!(host.user.as_deref(), Some("bob"));
        assert_eq!(host.pass.as_deref(), Some("other"));
    }

    #[test]
    fn test_redacted_masks_password() {
        let host = ConfigHost::new("r.example.com").with_credentials("alice", "pw");
        let shown = host.redacted();
        assert_eq!(shown.user.as_deref(), Some("alice"));
        assert_eq!(shown.pass.as_deref(), Some("***"));
    }

    #[test]
    fn test_debug_hides_password() {
        let host = ConfigHost::new("r.example.com").with_credentials("alice", "hunter2");
        let debug = format!("{host:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_serialize_uses_regcert_key() {
        let host = ConfigHost::new("r.example.com").with_reg_cert("PEM");
        let json = serde_json::to_value(&host).unwrap();
        assert_eq!(json["regcert"], "PEM");
        assert!(json.get("user").is_none());
    }
}
