use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

use crate::services::polling::PollPolicy;

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the order backend.
    #[validate(url)]
    pub backend_base_url: String,

    /// Fixed connection token sent with every order-creation call.
    #[validate(length(min = 1))]
    pub connection_token: String,

    /// Fixed access key sent with every order-creation call.
    #[validate(length(min = 1))]
    pub access_key: String,

    /// Provider identifier; 0 means self-service.
    #[serde(default)]
    pub provider_id: i64,

    /// Authenticated user identifier; 0 means anonymous.
    #[serde(default)]
    pub user_id: i64,

    /// Interval between payment confirmation passes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Optional upper bound on timed confirmation passes. Absent means the
    /// poller runs until every order is confirmed or the session is closed.
    #[serde(default)]
    pub poll_max_passes: Option<u32>,

    /// Per-call HTTP timeout for backend requests.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

impl AppConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_passes: self.poll_max_passes,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/` files and `APP__`-prefixed environment
/// variables. The connection token and access key have no defaults and must
/// be provided explicitly.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let builder = Config::builder()
        .set_default("provider_id", 0)?
        .set_default("user_id", 0)?
        .set_default("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?
        .set_default("http_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("environment", DEFAULT_ENV)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    for required in ["backend_base_url", "connection_token", "access_key"] {
        if config.get_string(required).is_err() {
            error!(
                "'{}' is not configured. Set APP__{} or add it to a config file.",
                required,
                required.to_uppercase()
            );
            return Err(AppConfigError::Load(ConfigError::NotFound(format!(
                "{} is required but not configured",
                required
            ))));
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
