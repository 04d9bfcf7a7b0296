//! # regclient
//!
//! Construction of registry clients from an ordered list of directives.
//!
//! A [`RegClient`] is assembled from [`Opt`] values: a log sink shared with
//! the invoking process, optional discovery of credentials and certificates
//! stored by the Docker CLI, and explicit per-host overrides. Construction
//! never touches the network; it only resolves which settings apply to
//! which registry host.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use regclient::{ConfigHost, LogSink, Opt, RegClient};
//!
//! let log = Arc::new(LogSink::default());
//! let client = RegClient::new(vec![
//!     Opt::WithLog(log),
//!     Opt::WithDockerCreds,
//!     Opt::WithConfigHosts(vec![
//!         ConfigHost::new("registry.example.com").with_credentials("ci", "s3cret"),
//!     ]),
//! ])?;
//!
//! assert!(client.host("registry.example.com").is_some());
//! # Ok::<(), regclient::RegClientError>(())
//! ```
//!
//! ## Host resolution
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐   ┌──────────────────┐
//! │ Docker config.json   │ → │ Docker certs.d       │ → │ explicit hosts   │
//! │ (WithDockerCreds)    │   │ (WithDockerCerts)    │   │ (WithConfigHosts)│
//! └──────────────────────┘   └──────────────────────┘   └──────────────────┘
//!            later sources override earlier ones field by field
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod docker;
mod error;
mod log;


pub use client::{Opt, RegClient};
pub use config::{ConfigHost, ParseTlsError, TlsConf};
pub use docker::{load_docker_certs, load_docker_credentials, normalize_hostname, DockerPaths};
pub use error::RegClientError;
pub use log::{LogFormat, LogLevel, LogSink, ParseLevelError};
