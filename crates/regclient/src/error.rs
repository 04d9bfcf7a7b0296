//! Error types for client construction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while constructing a registry client.
#[derive(Debug, Error)]
pub enum RegClientError {
    /// A host record is unusable.
    #[error("Invalid host configuration: {reason}")]
    InvalidHost {
        /// Why the record was rejected.
        reason: String,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    IoError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The Docker CLI configuration could not be parsed.
    #[error("Failed to parse Docker config at {path}: {source}")]
    DockerConfig {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A Docker `auths` entry could not be decoded.
    #[error("Invalid Docker credentials for {host}: {message}")]
    InvalidDockerAuth {
        /// Host the entry belongs to.
        host: String,
        /// Error message.
        message: String,
    },
}
