//! Client configuration from environment variables.
//!
//! The deployment environment (`DEPLOY_ENV`, falling back to `APP_ENV`)
//! selects between the production and development API hosts. The cookie
//! bridge lives on the app origin, which defaults to the API host when the
//! listing site and the API share an origin.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ClientError;
use crate::rate_limit::RateLimit;
use crate::retry::RetryPolicy;

const DEFAULT_DEV_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: Url,
    pub app_origin: Url,
    pub store_path: Option<PathBuf>,
    pub rate_limit: RateLimit,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Config pointing both API and bridge at `base`, with default policies.
    #[must_use]
    pub fn for_base(base: Url) -> Self {
        Self {
            app_origin: base.clone(),
            api_base: base,
            store_path: None,
            rate_limit: RateLimit::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the selected API URL is missing
    /// (production) or any URL fails to parse.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = lookup("DEPLOY_ENV").or_else(|| lookup("APP_ENV")).unwrap_or_default();
        let production = matches!(env.trim().to_ascii_lowercase().as_str(), "production" | "prod");

        let api_raw = if production {
            lookup("REALTY_API_URL_PRODUCTION")
                .ok_or_else(|| ClientError::Config("REALTY_API_URL_PRODUCTION is required in production".into()))?
        } else {
            lookup("REALTY_API_URL_DEVELOPMENT").unwrap_or_else(|| DEFAULT_DEV_API_URL.to_owned())
        };
        let api_base = parse_url("API URL", &api_raw)?;
        let app_origin = match lookup("REALTY_APP_ORIGIN") {
            Some(raw) => parse_url("REALTY_APP_ORIGIN", &raw)?,
            None => api_base.clone(),
        };

        let mut rate_limit = RateLimit::default();
        if let Some(max) = lookup("REALTY_RATE_LIMIT").and_then(|v| v.trim().parse().ok()) {
            rate_limit.max_requests = max;
        }
        if let Some(ms) = lookup("REALTY_RATE_WINDOW_MS").and_then(|v| v.trim().parse().ok()) {
            rate_limit.window = Duration::from_millis(ms);
        }

        Ok(Self {
            api_base,
            app_origin,
            store_path: lookup("REALTY_STORE_PATH").map(PathBuf::from),
            rate_limit,
            retry: RetryPolicy::default(),
        })
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw.trim()).map_err(|e| ClientError::Config(format!("{what} {raw:?}: {e}")))
}
