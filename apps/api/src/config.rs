use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_SESSION_VERIFY_URL: &str = "https://api.clerk.com/v1/sessions";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Base URL of the session-verification API; `/{token}/verify` is appended.
    pub session_verify_url: String,
    pub session_verify_secret: String,
    pub auth_timeout: Duration,
    pub history: HistoryLimits,
    /// Empty means permissive CORS.
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"<redacted>")
            .field("database_max_connections", &self.database_max_connections)
            .field("session_verify_url", &self.session_verify_url)
            .field("session_verify_secret", &"<redacted>")
            .field("auth_timeout", &self.auth_timeout)
            .field("history", &self.history)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

/// Page-size bounds for history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = HistoryLimits::default();
        let history = HistoryLimits {
            default_limit: parse_env("HISTORY_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: parse_env("HISTORY_MAX_LIMIT", defaults.max_limit)?,
        };
        if history.default_limit == 0 || history.default_limit > history.max_limit {
            bail!(
                "HISTORY_DEFAULT_LIMIT must be between 1 and HISTORY_MAX_LIMIT ({})",
                history.max_limit
            );
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            session_verify_url: std::env::var("SESSION_VERIFY_URL")
                .unwrap_or_else(|_| DEFAULT_SESSION_VERIFY_URL.to_string()),
            session_verify_secret: require_env("SESSION_VERIFY_SECRET")?,
            auth_timeout: Duration::from_millis(parse_env("AUTH_TIMEOUT_MS", 5_000)?),
            history,
            cors_allowed_origins: split_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
