use std::env;

use auth::TokenTtls;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub keys: KeysConfig,
    pub token: TokenConfig,
    pub oidc: OidcConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeysConfig {
    pub directory: String,
    pub size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl TokenConfig {
    pub fn ttls(&self) -> TokenTtls {
        TokenTtls {
            access: Duration::minutes(self.access_ttl_minutes),
            refresh: Duration::days(self.refresh_ttl_days),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OidcConfig {
    pub issuer: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
