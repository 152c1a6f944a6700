//! Wiring for one signed-in (or signing-in) front end.

use std::sync::Arc;

use models::{RouteTable, SessionScope};

use crate::config::ClientConfig;
use crate::context::AuthContext;
use crate::cookies::CookieBridge;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::store::TokenStore;

const USER_AGENT: &str = concat!("realty-client/", env!("CARGO_PKG_VERSION"));

/// Owns the shared HTTP client, token store, cookie bridge and auth context.
/// Dropping it drops the session state with it.
pub struct Session {
    config: ClientConfig,
    context: AuthContext,
}

impl Session {
    /// Build the session components. The store is file-backed when
    /// `config.store_path` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built,
    /// or [`ClientError::Storage`] if the session file cannot be read.
    pub async fn open(config: ClientConfig, scope: SessionScope) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;
        let store = match &config.store_path {
            Some(path) => TokenStore::open(path).await?,
            None => TokenStore::in_memory(),
        };
        let bridge = Arc::new(CookieBridge::new(http.clone(), config.app_origin.clone()));
        let api = ApiClient::new(http, &config, Arc::new(store), bridge.clone(), scope);
        let context = AuthContext::new(api, bridge, Arc::new(RouteTable::default()));
        tracing::debug!(api = %config.api_base, scope = ?scope, "session opened");
        Ok(Self { config, context })
    }

    #[must_use]
    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use models::Role;
    use time::macros::datetime;

    use crate::test_support::{MockApi, member, now, token};

    #[tokio::test]
    async fn stored_session_survives_reopen() {
        let mock = MockApi::start(
            Router::new()
                .route("/api/set-cookie", post(|| async { StatusCode::NO_CONTENT }))
                .route("/api/set-user-role", post(|| async { StatusCode::NO_CONTENT })),
        )
        .await;
        let path = std::env::temp_dir().join(format!("realty-session-{}.json", uuid::Uuid::new_v4()));
        let config = ClientConfig { store_path: Some(path.clone()), ..ClientConfig::for_base(mock.base.clone()) };
        let t = token(Role::User, now() + 3600);

        let first = Session::open(config.clone(), SessionScope::Client).await.unwrap();
        first
            .context()
            .login(member(datetime!(2024-01-01 00:00 UTC)), t.clone(), "/listings")
            .await
            .unwrap();
        drop(first);

        let second = Session::open(config, SessionScope::Client).await.unwrap();
        assert_eq!(second.context().api().store().token().await, Some(t));
        assert_eq!(second.context().scope(), SessionScope::Client);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn in_memory_session_starts_empty() {
        let config = ClientConfig::for_base(url::Url::parse("http://127.0.0.1:9").unwrap());
        let session = Session::open(config, SessionScope::Admin).await.unwrap();
        assert!(session.context().profile().await.is_none());
        assert_eq!(session.config().api_base.as_str(), "http://127.0.0.1:9/");
    }
}
