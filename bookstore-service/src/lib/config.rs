use std::env;

use auth::TokenLifetimes;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string; the in-memory store is used when absent.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub private_key_path: String,
    pub public_key_path: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

impl JwtConfig {
    /// Reject lifetimes outside `1..=MAX_ACCESS_TOKEN_TTL_MINUTES` and
    /// `1..=MAX_REFRESH_TOKEN_TTL_DAYS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&self.access_token_ttl_minutes) {
            return Err(ConfigError::Message(format!(
                "jwt.access_token_ttl_minutes must be between 1 and {}, got {}",
                MAX_ACCESS_TOKEN_TTL_MINUTES, self.access_token_ttl_minutes
            )));
        }

        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&self.refresh_token_ttl_days) {
            return Err(ConfigError::Message(format!(
                "jwt.refresh_token_ttl_days must be between 1 and {}, got {}",
                MAX_REFRESH_TOKEN_TTL_DAYS, self.refresh_token_ttl_days
            )));
        }

        Ok(())
    }

    pub fn token_lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: Duration::minutes(self.access_token_ttl_minutes),
            refresh: Duration::days(self.refresh_token_ttl_days),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_days() -> i64 {
    7
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__PRIVATE_KEY_PATH, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__ACCESS_TOKEN_TTL_MINUTES=5 overrides jwt.access_token_ttl_minutes
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.jwt.validate()?;

        Ok(config)
    }
}
