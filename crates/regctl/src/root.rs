//! Global flags resolved before any subcommand runs.

use std::path::PathBuf;

use clap::Args;
use regclient::{LogFormat, LogLevel, LogSink, ParseLevelError};
use thiserror::Error;

use crate::config::{self, ConfigError};

/// Log option that switches output to JSON.
const JSON_LOGOPT: &str = "json";

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct RootOpts {
    /// Log level (debug, info, warn, error, fatal, panic)
    #[arg(short = 'v', long, global = true, default_value = "warn")]
    pub verbosity: String,

    /// Log options, repeatable (json)
    #[arg(long = "logopt", value_name = "OPT", global = true)]
    pub logopts: Vec<String>,

    /// Config file [default: ~/.regctl/config.json]
    #[arg(long, value_name = "FILE", global = true, env = "REGCTL_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Default for RootOpts {
    fn default() -> Self {
        Self {
            verbosity: LogLevel::default().to_string(),
            logopts: Vec::new(),
            config: None,
        }
    }
}

/// Errors that stop an invocation before its subcommand runs.
#[derive(Debug, Error)]
pub enum RootError {
    /// The verbosity flag does not name a log level.
    #[error("Invalid verbosity: {source}")]
    Validation {
        /// Underlying parse error.
        #[from]
        source: ParseLevelError,
    },
}

impl RootOpts {
    /// Applies the flags to `sink`.
    ///
    /// The sink is left untouched when the verbosity is invalid. Any
    /// `--logopt json` selects JSON output; other options are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RootError::Validation`] for an unknown verbosity.
    pub fn apply(&self, sink: &mut LogSink) -> Result<(), RootError> {
        let level: LogLevel = self.verbosity.parse()?;
        sink.level = level;
        if self.logopts.iter().any(|opt| opt == JSON_LOGOPT) {
            sink.format = LogFormat::Json;
        }
        Ok(())
    }

    /// Returns the config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if no `--config` was given and the default location
    /// cannot be determined.
    pub fn config_path(&self) -> Result<PathBuf, ConfigError> {
        match self.config {
            Some(ref path) => Ok(path.clone()),
            None => config::default_path(),
        }
    }

    /// Returns the log options that have no effect.
    pub fn ignored_logopts(&self) -> impl Iterator<Item = &str> {
        self.logopts
            .iter()
            .map(String::as_str)
            .filter(|opt| *opt != JSON_LOGOPT)
    }
}
