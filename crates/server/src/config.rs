//! Server configuration

use anyhow::{Context, Result};
use estimator_lib::predictor::DEFAULT_CURRENCY_SYMBOL;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `HOUSE_PRICE_PORT`
pub const ENV_PREFIX: &str = "HOUSE_PRICE";

/// Optional config file name, without extension
pub const CONFIG_FILE: &str = "house-price";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to structured log events
    pub instance_name: String,

    /// Address the HTTP listener binds to
    pub bind_address: String,

    /// Port for the form, dashboard and health/metrics endpoints
    pub port: u16,

    /// Path of the pipeline manifest loaded at startup
    pub artifact_path: PathBuf,

    /// Symbol prefixed to formatted estimates
    pub currency_symbol: String,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "house-price".to_string())
}

impl ServerConfig {
    /// Load configuration from defaults, `house-price.{toml,yaml,json}` and
    /// `HOUSE_PRICE_*` environment variables, in increasing precedence
    pub fn load() -> Result<Self> {
        Self::build(None)
    }

    fn build(env: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("instance_name", default_instance_name())?
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("artifact_path", "artifacts/house_price_forest.json")?
            .set_default("currency_symbol", DEFAULT_CURRENCY_SYMBOL)?
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::build(Some(HashMap::new())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(
            config.artifact_path,
            PathBuf::from("artifacts/house_price_forest.json")
        );
        assert_eq!(config.currency_symbol, "₹");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::build(Some(env(&[
            ("HOUSE_PRICE_PORT", "9090"),
            ("HOUSE_PRICE_ARTIFACT_PATH", "/models/best_random_forest.json"),
            ("HOUSE_PRICE_BIND_ADDRESS", "127.0.0.1"),
            ("HOUSE_PRICE_INSTANCE_NAME", "estimator-0"),
        ])))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(
            config.artifact_path,
            PathBuf::from("/models/best_random_forest.json")
        );
        assert_eq!(config.instance_name, "estimator-0");
        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = ServerConfig::build(Some(env(&[("HOUSE_PRICE_PORT", "not-a-port")])));
        assert!(result.is_err());
    }
}
