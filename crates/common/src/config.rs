//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Payment processor configuration.
    pub payment: PaymentConfig,
    /// Organizer token verification.
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Mobile-money payment processor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Base URL of the processor API.
    #[serde(default = "default_payment_base_url")]
    pub base_url: String,
    /// Secret key used as the bearer token and webhook signing key.
    pub secret_key: String,
    /// Timeout for a single processor call, in seconds.
    #[serde(default = "default_payment_timeout")]
    pub timeout_secs: u64,
    /// Domain used to synthesize the customer email the processor requires.
    #[serde(default = "default_customer_email_domain")]
    pub customer_email_domain: String,
    /// Where the processor redirects the voter after checkout.
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Organizer authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer.
    pub jwt_secret: String,
    /// Expected `iss` claim, if the issuer sets one.
    #[serde(default)]
    pub issuer: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_payment_base_url() -> String {
    "https://api.paystack.co".to_string()
}

const fn default_payment_timeout() -> u64 {
    15
}

fn default_customer_email_domain() -> String {
    "voters.evote.local".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `EVOTE_ENV`)
    /// 3. Environment variables with `EVOTE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("EVOTE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("EVOTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("EVOTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
