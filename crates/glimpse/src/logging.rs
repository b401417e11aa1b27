//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem with human-readable or JSON output. Logs go to
//! stderr; stdout carries hash and comparison records only.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Effective logging settings after applying command line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl LogSettings {
    /// Merge the `[logging]` section with `--verbose` and `--json-logs`.
    ///
    /// `--verbose` raises the level to `debug` but never lowers a configured
    /// `trace`.
    pub fn resolve(config: &glimpse_core::Config, verbose: bool, json_logs: bool) -> Self {
        let configured = config.logging.level.to_lowercase();
        let level = if verbose && configured != "trace" {
            "debug".to_string()
        } else {
            configured
        };

        Self {
            level,
            json: json_logs || config.logging.format == "json",
        }
    }
}

/// Install the global subscriber.
///
/// The RUST_LOG environment variable overrides `settings.level`.
pub fn init(settings: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    if settings.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the configuration file plus CLI overrides.
pub fn init_from_config(config: &glimpse_core::Config, verbose: bool, json_logs: bool) {
    init(&LogSettings::resolve(config, verbose, json_logs));
}
