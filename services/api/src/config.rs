//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub coach_model: String,
    pub assessment_model: String,
    pub ai_timeout: Duration,
    pub session_ttl: chrono::Duration,
    /// Adds `Secure` to the session cookie. Off for plain-HTTP development.
    pub secure_cookies: bool,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Load Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_ttl_hours = positive_integer("SESSION_TTL_HOURS", &var_or("SESSION_TTL_HOURS", "24"))?;
        // Every login computes `now + ttl`, so the sum has to fit a timestamp.
        let session_ttl = i64::try_from(session_ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_TTL_HOURS".to_string(),
                    format!("'{}' hours is out of range", session_ttl_hours),
                )
            })?;
        let secure_cookies = boolean("SECURE_COOKIES", &var_or("SECURE_COOKIES", "false"))?;
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:5173");

        // --- Load AI Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let coach_model = var_or("COACH_MODEL", "gpt-4o");
        let assessment_model = var_or("ASSESSMENT_MODEL", "gpt-4o");
        let ai_timeout_secs = positive_integer("AI_TIMEOUT_SECS", &var_or("AI_TIMEOUT_SECS", "30"))?;

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            coach_model,
            assessment_model,
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            session_ttl,
            secure_cookies,
            cors_origin,
        })
    }

    /// Returns the OpenAI key or the error the server binary reports without it.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}

fn positive_integer(name: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

fn boolean(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", raw),
        )),
    }
}
