//! Layered application configuration.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. `motocar.toml` in the working directory (optional)
//! 3. Environment variables `MOTOCAR__<SECTION>__<KEY>`, after `.env` is loaded
//!
//! e.g. `MOTOCAR__SERVER__PORT=9000`, `MOTOCAR__DATABASE__URL=sqlite://ads.db`.

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "MOTOCAR";
const FILE_NAME: &str = "motocar";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration value {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; may carry credentials for non-file backends.
    pub url: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding every bucket.
    pub root: PathBuf,
    pub bucket: String,
    /// URL prefix the uploads are served under.
    pub public_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_hours: i64,
    /// Where password credentials persist. Unset keeps them in memory only.
    pub credentials_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl AppConfig {
    /// Loads `.env`, then the layered sources.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), ".env loaded");
        }

        Self::build(
            Config::builder()
                .add_source(File::with_name(FILE_NAME).required(false))
                .add_source(environment()),
        )
    }

    /// Applies defaults beneath `sources`, deserializes and validates.
    pub fn build(sources: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = with_defaults(sources)?.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port", "must be non-zero".into()));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.bucket", "must not be empty".into()));
        }
        if !self.storage.public_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(
                "storage.public_prefix",
                format!("{:?} must start with '/'", self.storage.public_prefix),
            ));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_hours", "must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

/// `MOTOCAR__SECTION__KEY` variables.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite://data/motocar.db")?
        .set_default("storage.root", "./data/uploads")?
        .set_default("storage.bucket", "listing-images")?
        .set_default("storage.public_prefix", "/media")?
        .set_default("auth.session_ttl_hours", 24)?
        .set_default("auth.credentials_path", "./data/credentials.json")?
        .set_default("log.json", false)?
        .set_default("log.filter", "info")?)
}
