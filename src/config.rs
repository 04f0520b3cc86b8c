//! Configuration layer: typed settings with layered precedence
//! (defaults → optional file → environment).
//!
//! Environment variables use the `VETRINA_` prefix with `__` as the
//! section separator, e.g. `VETRINA_API__BASE_URL=http://localhost:8000`.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::query::QueryConfig;

const ENV_PREFIX: &str = "VETRINA";
const LOCAL_CONFIG_BASENAME: &str = "vetrina";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Transport settings for [`crate::client::ApiClient`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Root of the backend, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Optional bearer key sent on every request.
    pub api_key: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_key: None,
        }
    }
}

/// Cache settings feeding [`QueryConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_stale_after_ms: Option<u64>,
    pub log_fetches: Option<bool>,
}

impl From<&QuerySettings> for QueryConfig {
    fn from(settings: &QuerySettings) -> Self {
        let defaults = QueryConfig::default();
        Self {
            default_stale_after_ms: settings.default_stale_after_ms,
            log_fetches: settings.log_fetches.unwrap_or(defaults.log_fetches),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub query: QuerySettings,
}

impl Settings {
    /// Load settings from `vetrina.toml` (or an explicit file) layered
    /// under `VETRINA_`-prefixed environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        builder = match config_file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
        };
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}
