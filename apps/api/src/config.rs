//! API configuration module.
//!
//! Values are layered, lowest priority first:
//!
//! 1. built-in defaults
//! 2. `tienda.toml` in the working directory, or the file named by
//!    `TIENDA_CONFIG` (optional)
//! 3. environment variables `TIENDA__<SECTION>__<KEY>`,
//!    e.g. `TIENDA__SERVER__PORT=9000` or `TIENDA__MAIL__RELAY_URL=...`

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::env;

/// Default file stem looked up when `TIENDA_CONFIG` is unset.
const DEFAULT_CONFIG_FILE: &str = "tienda";

/// Full API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Sender address on confirmation emails
    pub from: String,

    /// When set, messages are POSTed here instead of being logged
    #[serde(default)]
    pub relay_url: Option<String>,

    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Loads configuration from defaults, the optional file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("TIENDA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let builder = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("TIENDA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// Applies defaults beneath `builder`'s sources and validates the result.
    pub(crate) fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ApiConfig = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000_i64)?
            .set_default("database.path", "./tienda.db")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("auth.jwt_secret", "")?
            .set_default("mail.from", "no-reply@tienda.local")?
            .set_default("mail.timeout_secs", 10_i64)?
            .build()?
            .try_deserialize()?;

        if config.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }

        Ok(config)
    }

    /// `host:port` for the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
