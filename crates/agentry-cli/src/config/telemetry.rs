//! Logging configuration.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration options.
///
/// The log level itself is taken from `RUST_LOG` and defaults to `info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args)]
pub struct TelemetryConfig {
    /// Output format of log lines written to stderr.
    #[arg(long, env = "AGENTRY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Disables ANSI colors in text output.
    #[arg(long, env = "AGENTRY_LOG_NO_ANSI")]
    #[serde(default)]
    pub no_ansi: bool,
}

impl TelemetryConfig {
    /// Returns whether text output should be colored.
    #[must_use]
    pub fn ansi(&self) -> bool {
        self.log_format == LogFormat::Text && !self.no_ansi
    }
}
