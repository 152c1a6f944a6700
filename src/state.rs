//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and middleware via the `State`
//! extractor. Sessions are stateless signed tokens, so the only live data is
//! configuration plus the handles needed to verify and re-issue them.

use std::sync::Arc;

use models::RouteTable;
use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::github::GitHubConfig;
use crate::services::token::TokenIssuer;

/// Clone is required by Axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<ServerConfig>,
    pub tokens: TokenIssuer,
    /// `None` when the GitHub env vars are absent; social login answers 503.
    pub github: Option<GitHubConfig>,
    pub routes: Arc<RouteTable>,
    /// Outbound client for the OAuth provider.
    pub http: reqwest::Client,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: ServerConfig, github: Option<GitHubConfig>) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_secs);
        Self {
            pool,
            config: Arc::new(config),
            tokens,
            github,
            routes: Arc::new(RouteTable::default()),
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.config.cookie_secure()
    }
}

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
