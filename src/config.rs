//! Configuration loading and types for photo-cascade.
//!
//! Configuration comes from environment variables and is deserialized into
//! the [`Config`] struct at process start.  A missing required variable
//! fails startup; nothing is re-read per invocation.

use std::time::Duration;

use config::{ConfigError, Environment};
use serde::Deserialize;

/// Largest number of pooled database connections.
pub const DB_MAX_CONNECTIONS: usize = 1;

/// Pooled connections idle for longer than this are closed.
pub const DB_IDLE_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Upper bound for establishing a database connection.
pub const DB_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Top-level configuration.
///
/// Field names are the lowercased environment variable names.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Metadata database host (`PHOTOS_META_DB_HOST`).
    #[serde(rename = "photos_meta_db_host")]
    pub db_host: String,

    /// Metadata database user (`PHOTOS_META_DB_USER`).
    #[serde(rename = "photos_meta_db_user")]
    pub db_user: String,

    /// Metadata database password (`PHOTOS_META_DB_PASSWORD`).
    #[serde(rename = "photos_meta_db_password")]
    pub db_password: String,

    /// Metadata database port (`PHOTOS_META_DB_PORT`).
    #[serde(rename = "photos_meta_db_port")]
    pub db_port: u16,

    /// Metadata database name (`PHOTOS_META_DB_NAME`).
    #[serde(rename = "photos_meta_db_name")]
    pub db_name: String,

    /// Bucket holding the resized photos (`RESIZED_PHOTOS_BUCKET`).
    pub resized_photos_bucket: String,

    /// Custom S3-compatible endpoint, e.g. MinIO or LocalStack
    /// (`AWS_ENDPOINT_URL`).
    #[serde(rename = "aws_endpoint_url", default)]
    pub s3_endpoint_url: Option<String>,

    /// Force path-style bucket addressing (`S3_FORCE_PATH_STYLE`).
    #[serde(default)]
    pub s3_force_path_style: bool,

    /// Log level: trace, debug, info, warn, error (`LOG_LEVEL`).
    pub log_level: String,

    /// Log format: json or text (`LOG_FORMAT`).
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

/// Connection settings for the metadata database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_db_port(),
            user: String::new(),
            password: String::new(),
            name: String::new(),
            max_connections: DB_MAX_CONNECTIONS,
            idle_timeout: DB_IDLE_TIMEOUT,
            connect_timeout: DB_CONNECT_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(config::Config::builder().add_source(Environment::default()))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let s = with_defaults(builder)?.build()?;
        s.try_deserialize()
    }

    /// Database settings, with the fixed pool limits applied.
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            name: self.db_name.clone(),
            ..DatabaseConfig::default()
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_db_port() -> u16 {
    5432
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    builder
        .set_default("photos_meta_db_port", i64::from(default_db_port()))?
        .set_default("s3_force_path_style", false)?
        .set_default("log_level", "info")?
        .set_default("log_format", "json")
}
