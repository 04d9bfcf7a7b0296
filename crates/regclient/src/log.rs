//! Log sink shared between the invoking process and the clients it builds.
//!
//! The sink is a plain value: the CLI fills it from its flags, installs the
//! global subscriber once with [`LogSink::init`], and hands the same value to
//! every client it constructs.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Log verbosity levels accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    /// Everything, including resolution details.
    Debug,
    /// Informational messages.
    Info,
    /// Warnings only (default).
    #[default]
    Warn,
    /// Errors only.
    Error,
    /// Fatal errors only.
    Fatal,
    /// Panics only.
    Panic,
}

impl LogLevel {
    /// All levels, from most to least verbose.
    pub const ALL: [Self; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::Panic,
    ];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
        }
    }

    /// Returns the `tracing` filter for this level.
    ///
    /// `tracing` stops at `ERROR`, so `fatal` and `panic` share its filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use regclient::LogLevel;
    /// use tracing::level_filters::LevelFilter;
    ///
    /// assert_eq!(LogLevel::Warn.level_filter(), LevelFilter::WARN);
    /// assert_eq!(LogLevel::Panic.level_filter(), LevelFilter::ERROR);
    /// ```
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error | Self::Fatal | Self::Panic => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case. `warning` is accepted for `warn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "panic" => Ok(Self::Panic),
            _ => Err(ParseLevelError {
                level: s.to_string(),
            }),
        }
    }
}

/// Error returned for an unknown log level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid log level: {level:?} (expected debug, info, warn, error, fatal or panic)")]
pub struct ParseLevelError {
    /// The rejected input.
    pub level: String,
}

/// Shape of emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogFormat {
    /// Human readable text (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Log level and output shape for a process and its clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSink {
    /// Maximum verbosity.
    pub level: LogLevel,
    /// Output shape.
    pub format: LogFormat,
}

impl LogSink {
    /// Creates a sink with the given level and format.
    #[must_use]
    pub const fn new(level: LogLevel, format: LogFormat) -> Self {
        Self { level, format }
    }

    /// Returns true if events at `level` pass this sink's filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use regclient::{LogLevel, LogSink};
    ///
    /// let sink = LogSink::default();
    /// assert!(sink.enabled(LogLevel::Error));
    /// assert!(!sink.enabled(LogLevel::Debug));
    /// ```
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.level_filter() <= self.level.level_filter()
    }

    /// Builds a `tracing` subscriber writing this sink's format to `writer`.
    ///
    /// The subscriber is not installed; use [`LogSink::init`] for the
    /// process-wide one, or `tracing::subscriber::with_default` for a scope.
    #[must_use]
    pub fn subscriber<W>(&self, writer: W) -> Box<dyn Subscriber + Send + Sync + 'static>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let builder = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_max_level(self.level.level_filter());

        match self.format {
            LogFormat::Text => Box::new(builder.finish()),
            LogFormat::Json => Box::new(builder.json().finish()),
        }
    }

    /// Installs the global `tracing` subscriber described by this sink.
    ///
    /// Output goes to stderr so stdout stays free for command results.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber has already been installed.
    pub fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        tracing::subscriber::set_global_default(self.subscriber(std::io::stderr))?;
        Ok(())
    }
}
