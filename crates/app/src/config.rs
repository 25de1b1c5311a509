//! Desk configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `dispatchdesk.toml` in the working directory, then `DISPATCHDESK__*`
//! environment variables (`__` separates nested keys, e.g.
//! `DISPATCHDESK__LOG__JSON=false`). A `.env` file is loaded first if present.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use dispatchdesk_observability::LogConfig;

use crate::error::DeskResult;

const CONFIG_FILE: &str = "dispatchdesk";
const ENV_PREFIX: &str = "DISPATCHDESK";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeskConfig {
    /// Currency code shown next to amounts (amounts themselves are whole units of it).
    pub currency: String,
    /// Load the demo invoices, field reps and purchase orders at startup.
    pub seed_demo_data: bool,
    pub log: LogConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            currency: "KES".to_string(),
            seed_demo_data: true,
            log: LogConfig::default(),
        }
    }
}

impl DeskConfig {
    /// Load from `.env`, `dispatchdesk.toml` and the process environment.
    pub fn load() -> DeskResult<Self> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();

        let settings = defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load from TOML text layered over the defaults.
    pub fn from_toml(source: &str) -> DeskResult<Self> {
        let settings = defaults()?
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let fallback = DeskConfig::default();
    Config::builder()
        .set_default("currency", fallback.currency)?
        .set_default("seed_demo_data", fallback.seed_demo_data)?
        .set_default("log.filter", fallback.log.filter)?
        .set_default("log.json", fallback.log.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeskError;

    #[test]
    fn empty_source_yields_defaults() {
        let config = DeskConfig::from_toml("").unwrap();
        assert_eq!(config, DeskConfig::default());
        assert_eq!(config.currency, "KES");
        assert!(config.seed_demo_data);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = DeskConfig::from_toml(
            r#"
            currency = "UGX"
            seed_demo_data = false

            [log]
            json = false
            "#,
        )
        .unwrap();

        assert_eq!(config.currency, "UGX");
        assert!(!config.seed_demo_data);
        assert!(!config.log.json);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = DeskConfig::from_toml("seed_demo_data = \"sometimes\"").unwrap_err();
        assert!(matches!(err, DeskError::Config(_)));
    }
}
