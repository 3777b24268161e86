//! Configuration management for the Hirafic marketplace
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with HIRAFIC_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Password hashing configuration
    pub auth: AuthConfig,

    /// Geocoding provider configuration
    pub geocoder: GeocoderConfig,

    /// Outgoing mail configuration
    pub mail: MailConfig,

    /// Nearby search defaults
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

/// Which store implementation backs the service
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Store implementation
    pub backend: StorageBackend,

    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// bcrypt cost factor
    pub password_hash_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    /// Address search endpoint (Nominatim-compatible)
    pub base_url: String,

    /// User-Agent sent with every lookup
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// When false, messages are logged instead of sent
    pub enabled: bool,

    /// SMTP relay host (STARTTLS)
    pub smtp_host: String,

    /// SMTP relay port
    pub smtp_port: u16,

    /// SMTP login
    #[serde(default)]
    pub username: String,

    /// SMTP password
    #[serde(default)]
    pub password: String,

    /// Sender address on every message
    pub from_address: String,

    /// Recipient of issue reports
    pub operations_mailbox: String,

    /// Send timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Radius used when the caller gives none
    pub default_radius_km: f64,

    /// Page size used when only `page` is given
    pub default_per_page: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("HIRAFIC_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 86400)?
            .set_default("auth.password_hash_cost", 12)?
            .set_default("geocoder.base_url", "https://nominatim.openstreetmap.org/search")?
            .set_default("geocoder.user_agent", "Hirafic_Project/1.0")?
            .set_default("geocoder.timeout_secs", 10)?
            .set_default("mail.enabled", false)?
            .set_default("mail.smtp_host", "smtp.gmail.com")?
            .set_default("mail.smtp_port", 587)?
            .set_default("mail.from_address", "hiraficproject@gmail.com")?
            .set_default("mail.operations_mailbox", "hiraficproject@gmail.com")?
            .set_default("mail.timeout_secs", 15)?
            .set_default("search.default_radius_km", 5.0)?
            .set_default("search.default_per_page", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (HIRAFIC_ prefix)
            .add_source(
                Environment::with_prefix("HIRAFIC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
