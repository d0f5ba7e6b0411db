//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Any missing or malformed
//! value is reported as a [`ConfigError`] and halts startup.

use std::env;
use std::str::FromStr;

/// Default NK OAuth base URL.
pub const DEFAULT_NK_OAUTH_URL: &str = "https://oauth-logbook.nksports.com/oauth";
/// Default NK Logbook API base URL.
pub const DEFAULT_NK_API_URL: &str = "https://logbook-api.nksports.com/api/v1";

/// Runtime mode, controls log format and error detail exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Production,
    Test,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "development" => Ok(RuntimeMode::Development),
            "production" => Ok(RuntimeMode::Production),
            "test" => Ok(RuntimeMode::Test),
            other => Err(ConfigError::Invalid {
                name: "APP_ENV",
                reason: format!("expected development|production|test, got '{}'", other),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// NK OAuth client ID
    pub nk_client_id: String,
    /// NK OAuth client secret
    pub nk_client_secret: String,
    /// Redirect URI registered with NK (where the frontend receives the code)
    pub nk_redirect_uri: String,
    /// NK OAuth base URL (token and authorize endpoints live below it)
    pub nk_oauth_url: String,
    /// NK Logbook API base URL
    pub nk_api_url: String,
    /// Database connection string
    pub database_url: String,
    /// Frontend URL, allowed by CORS
    pub frontend_url: String,
    /// Runtime mode
    pub mode: RuntimeMode,
    /// Server port
    pub port: u16,
    /// Requests allowed per client per one-second window
    pub rate_limit_per_second: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            nk_client_id: required("NK_CLIENT_ID")?,
            nk_client_secret: required("NK_CLIENT_SECRET")?,
            nk_redirect_uri: required("NK_REDIRECT_URI")?,
            nk_oauth_url: env::var("NK_OAUTH_URL")
                .unwrap_or_else(|_| DEFAULT_NK_OAUTH_URL.to_string()),
            nk_api_url: env::var("NK_API_URL").unwrap_or_else(|_| DEFAULT_NK_API_URL.to_string()),
            database_url: required("DATABASE_URL")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            mode: optional_parsed("APP_ENV", RuntimeMode::Development)?,
            port: optional_parsed("PORT", 3001)?,
            rate_limit_per_second: optional_parsed("RATE_LIMIT_PER_SECOND", 10)?,
        })
    }

    /// Config for tests, pointing at the real vendor URLs until overridden.
    pub fn test_default() -> Self {
        Self {
            nk_client_id: "test_client_id".to_string(),
            nk_client_secret: "test_client_secret".to_string(),
            nk_redirect_uri: "http://localhost:5173/nk-auth-redirect".to_string(),
            nk_oauth_url: DEFAULT_NK_OAUTH_URL.to_string(),
            nk_api_url: DEFAULT_NK_API_URL.to_string(),
            database_url: "memory://".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            mode: RuntimeMode::Test,
            port: 3001,
            rate_limit_per_second: 10,
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.to_string())
}

fn optional_parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
