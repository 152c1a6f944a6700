//! Server configuration parsed from environment variables.

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;
const DEFAULT_TOKEN_REFRESH_WINDOW_SECS: i64 = 3_600;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CLIENT_URL: &str = "http://localhost:3001";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
}

/// Deployment flavor. Only production marks cookies `Secure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Tokens closer than this to expiry are rotated on authenticated calls.
    pub token_refresh_window_secs: i64,
    pub environment: Environment,
    /// Where OAuth completion redirects land (the listing client).
    pub client_url: String,
    /// Static site served behind the route guard.
    pub site_dir: PathBuf,
    /// Explicit `COOKIE_SECURE` override of the environment default.
    pub cookie_secure_override: Option<bool>,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`
    /// - `JWT_SECRET` (at least 32 bytes)
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `TOKEN_TTL_SECS`: default 86400
    /// - `TOKEN_REFRESH_WINDOW_SECS`: default 3600
    /// - `APP_ENV`: `production` or anything else for development
    /// - `CLIENT_URL`: default `http://localhost:3001`
    /// - `SITE_DIR`: default `./site`
    /// - `COOKIE_SECURE`: overrides the `APP_ENV` default for the `Secure` flag
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing or unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?.max(1);
        let token_ttl_secs = parse_or(&lookup, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        let token_refresh_window_secs =
            parse_or(&lookup, "TOKEN_REFRESH_WINDOW_SECS", DEFAULT_TOKEN_REFRESH_WINDOW_SECS)?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid { key: "TOKEN_TTL_SECS", value: token_ttl_secs.to_string() });
        }

        let environment = Environment::parse(lookup("APP_ENV").as_deref());
        let client_url = lookup("CLIENT_URL")
            .unwrap_or_else(|| DEFAULT_CLIENT_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let site_dir = lookup("SITE_DIR").map_or_else(|| PathBuf::from("site"), PathBuf::from);
        let cookie_secure_override = lookup("COOKIE_SECURE").as_deref().and_then(parse_bool);

        Ok(Self {
            port,
            database_url,
            db_max_connections,
            jwt_secret,
            token_ttl_secs,
            token_refresh_window_secs,
            environment,
            client_url,
            site_dir,
            cookie_secure_override,
        })
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure_override
            .unwrap_or(self.environment == Environment::Production)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
