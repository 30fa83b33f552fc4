//! Tracing subscriber initialization.
//!
//! The filter comes from `RUST_LOG` when it is set, otherwise from the
//! caller's default directive (the CLI verbosity flag).

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("invalid log filter {directive:?}: {message}")]
    InvalidFilter { directive: String, message: String },
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable single-line output.
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub default_directive: String,
    pub format: LogFormat,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Build the filter from an optional `RUST_LOG` value and a fallback directive.
///
/// A set but unparsable `RUST_LOG` falls back to the directive; an invalid
/// directive is an error.
pub fn build_filter(env: Option<&str>, default_directive: &str) -> Result<EnvFilter, ObservabilityError> {
    if let Some(filter) = env
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
    {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive).map_err(|e| ObservabilityError::InvalidFilter {
        directive: default_directive.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(options: &LogOptions) -> Result<(), ObservabilityError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), &options.default_directive)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match options.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins_over_default_directive() {
        let filter = build_filter(Some("tenantpulse_cli=trace"), "warn").unwrap();
        assert_eq!(filter.to_string(), "tenantpulse_cli=trace");
    }

    #[test]
    fn blank_or_bad_rust_log_falls_back() {
        let filter = build_filter(Some("  "), "debug").unwrap();
        assert_eq!(filter.to_string(), "debug");
        let filter = build_filter(Some("tenantpulse=verbose"), "info").unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn invalid_default_directive_is_an_error() {
        let err = build_filter(None, "tenantpulse=verbose").unwrap_err();
        assert!(matches!(err, ObservabilityError::InvalidFilter { .. }));
    }

    #[test]
    fn init_twice_is_harmless() {
        let options = LogOptions {
            default_directive: "warn".to_string(),
            format: LogFormat::Compact,
        };
        init(&options).unwrap();
        init(&options).unwrap();
    }
}
