//! Tracing/logging initialization.
//!
//! One `fmt` subscriber per process, filtered through `EnvFilter`. `RUST_LOG`
//! takes precedence over the configured filter.

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Logging settings, usually nested under `log` in the application config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// JSON lines when true, human-readable output otherwise.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: true,
        }
    }
}

impl LogConfig {
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: &LogConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json_at_info() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "info");
        assert!(config.json);
    }

    #[test]
    fn repeated_init_is_a_no_op() {
        let config = LogConfig {
            filter: "debug".to_string(),
            json: false,
        };
        init(&config);
        init(&config);
        ::tracing::info!("still logging after double init");
    }

    #[test]
    fn bad_directive_falls_back() {
        let config = LogConfig {
            filter: "=[".to_string(),
            json: true,
        };
        // Must not panic; falls back to `info`.
        let _ = config.env_filter();
    }
}
