//! Logging and tracing utilities

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "warn,chartmind=info";

/// Output format of the log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one event per line
    #[default]
    Pretty,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors raised while setting up tracing
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The requested log format does not exist
    #[error("Unknown log format: {0} (expected 'pretty' or 'json')")]
    UnknownFormat(String),

    /// A global subscriber was already installed
    #[error("Failed to install tracing subscriber: {0}")]
    AlreadyInitialized(String),
}

/// Initialize tracing subscriber with default configuration
///
/// Silently keeps an already installed subscriber, so tests and binaries can
/// both call it.
pub fn init_tracing() {
    let _ = init_tracing_with(LogFormat::Pretty, DEFAULT_DIRECTIVE);
}

/// Initialize tracing with an explicit format and fallback filter
///
/// `RUST_LOG` takes precedence over `default_directive` when it is set.
pub fn init_tracing_with(format: LogFormat, default_directive: &str) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(false)))
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::UnknownFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing();
        assert!(init_tracing_with(LogFormat::Json, DEFAULT_DIRECTIVE).is_err());
    }
}
