//! Log output for `rlink`, routed through `tracing` to stderr.
//!
//! - `warn`: skipped malformed rows (quiet mode shows only these and errors)
//! - `info`: per-year and per-round counts (default)
//! - `debug`: one event per match (`-v`)
//! - `trace`: resolver narrowing detail (`-vv`)
//!
//! `RUST_LOG` overrides the flag-derived level when set.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// `-q` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        let level = if quiet {
            Level::WARN
        } else {
            match verbose {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };
        Self {
            level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!(
            "warn,rosterlink_linkage={level},rosterlink_cli={level},rlink={level}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(LogConfig::from_flags(0, false).level, Level::INFO);
        assert_eq!(LogConfig::from_flags(1, false).level, Level::DEBUG);
        assert_eq!(LogConfig::from_flags(3, false).level, Level::TRACE);
        assert_eq!(LogConfig::from_flags(2, true).level, Level::WARN);
    }
}
