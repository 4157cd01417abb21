use crate::adapters::outbound::MongoConfig;
use crate::application::MonitorConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP server settings
    pub host: String,
    pub port: u16,
    pub shutdown_grace_secs: u64,
    pub debug: bool,

    // MongoDB settings
    pub mongodb_uri: String,
    pub mongodb_max_pool_size: u32,
    pub mongodb_timeout_ms: u64,

    // Overload monitor settings
    pub overload_tick_interval_ms: u64,
    pub max_connections_allowed_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_grace_secs: 10,
            debug: false,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_max_pool_size: 50,
            mongodb_timeout_ms: 5000,
            overload_tick_interval_ms: 5000,
            max_connections_allowed_ratio: 1.0,
        }
    }
}

impl Config {
    /// Address the HTTP server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn mongo(&self) -> MongoConfig {
        MongoConfig {
            uri: self.mongodb_uri.clone(),
            max_pool_size: self.mongodb_max_pool_size,
            server_selection_timeout: Duration::from_millis(self.mongodb_timeout_ms),
            app_name: Some(env!("CARGO_PKG_NAME").to_string()),
        }
    }

    pub fn monitor(&self) -> MonitorConfig {
        MonitorConfig::default()
            .tick_interval(Duration::from_millis(self.overload_tick_interval_ms))
            .max_connections_allowed_ratio(self.max_connections_allowed_ratio)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mongodb_uri.trim().is_empty() {
            return Err(ConfigError::MissingMongoUri);
        }
        if self.mongodb_max_pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        if self.overload_tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        if !self.max_connections_allowed_ratio.is_finite() || self.max_connections_allowed_ratio <= 0.0
        {
            return Err(ConfigError::InvalidRatio(self.max_connections_allowed_ratio));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("MONGODB_URI must not be empty")]
    MissingMongoUri,
    #[error("MONGODB_MAX_POOL_SIZE must be greater than zero")]
    InvalidPoolSize,
    #[error("OVERLOAD_TICK_INTERVAL_MS must be greater than zero")]
    InvalidTickInterval,
    #[error("MAX_CONNECTIONS_ALLOWED_RATIO must be a positive number, got {0}")]
    InvalidRatio(f64),
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from an arbitrary variable lookup.
///
/// Unparseable numbers fall back to their defaults.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let host = var("HOST").unwrap_or(defaults.host);

    let port = var("PORT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.port);

    let shutdown_grace_secs = var("SHUTDOWN_GRACE_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.shutdown_grace_secs);

    let debug = var("DEBUG").is_some();

    let mongodb_uri = var("MONGODB_URI").unwrap_or(defaults.mongodb_uri);

    let mongodb_max_pool_size = var("MONGODB_MAX_POOL_SIZE")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.mongodb_max_pool_size);

    let mongodb_timeout_ms = var("MONGODB_TIMEOUT_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.mongodb_timeout_ms);

    let overload_tick_interval_ms = var("OVERLOAD_TICK_INTERVAL_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.overload_tick_interval_ms);

    let max_connections_allowed_ratio = var("MAX_CONNECTIONS_ALLOWED_RATIO")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.max_connections_allowed_ratio);

    Ok(Config {
        host,
        port,
        shutdown_grace_secs,
        debug,
        mongodb_uri,
        mongodb_max_pool_size,
        mongodb_timeout_ms,
        overload_tick_interval_ms,
        max_connections_allowed_ratio,
    })
}
