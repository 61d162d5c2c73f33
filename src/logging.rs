//! Tracing subscriber setup

use std::io;

use anyhow::{Result, anyhow};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Parse a configured format name, falling back to `Pretty`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Effective filter directive: `RUST_LOG` wins, then `--verbose`, then config
#[must_use]
pub fn filter_directive(config: &LoggingConfig, verbose: bool, rust_log: Option<String>) -> String {
    rust_log.unwrap_or_else(|| {
        let level = if verbose { "debug" } else { config.level.as_str() };
        format!("{level},reqwest=warn,hyper=warn,fjall=warn,lsm_tree=warn")
    })
}

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let directive = filter_directive(config, verbose, std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| anyhow!("Invalid log filter '{directive}': {e}"))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let format = LogFormat::from_name(&config.format);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(io::stderr))
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    info!(
        version = crate::VERSION,
        log.level = %config.level,
        log.format = ?format,
        "kitewindows starting up"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    #[case("pretty", LogFormat::Pretty)]
    #[case("unknown", LogFormat::Pretty)]
    fn test_format_names(#[case] name: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_name(name), expected);
    }

    #[test]
    fn test_filter_precedence() {
        let config = LoggingConfig::default();
        assert!(filter_directive(&config, false, None).starts_with("info,"));
        assert!(filter_directive(&config, true, None).starts_with("debug,"));
        assert_eq!(
            filter_directive(&config, true, Some("kitewindows=trace".to_string())),
            "kitewindows=trace"
        );
    }
}
