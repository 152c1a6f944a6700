//! Auth Context: the session state machine a front end renders from.
//!
//! ARCHITECTURE
//! ============
//! Status starts at `Loading` and moves to `Authenticated` or
//! `Unauthenticated` once the cookie and the stored session have been
//! read. Watchers subscribe through a `tokio::sync::watch` channel.
//!
//! The server's verdict from the cookie bridge decides first; local decoding
//! of the token only adds the expiry check. The role cookie is kept in line
//! with the verified role. Navigation is returned as a [`Navigation`] value
//! and left to the caller to perform.

use std::sync::Arc;

use models::claims::{decode_unverified, is_placeholder_token};
use models::wire::{CookieTokenResponse, Credentials, RegisterRequest};
use models::{LoginResponse, Profile, ProfileError, Role, RouteTable, SessionScope, SessionVerdict};
use tokio::sync::watch;
use url::{Position, Url};

use crate::cookies::CookieBridge;
use crate::error::ClientError;
use crate::http::{ApiClient, Auth};
use crate::store::{SessionSnapshot, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// What the front end should do after a session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    /// Client-side route change.
    Push(String),
    /// Full page load of a new location.
    Assign(String),
    Reload,
    /// Rewrite the current history entry without loading anything.
    Replace(String),
}

/// Current Unix time in seconds, the clock [`AuthContext::evaluate`] expects.
#[must_use]
pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

pub struct AuthContext {
    scope: SessionScope,
    routes: Arc<RouteTable>,
    store: Arc<TokenStore>,
    bridge: Arc<CookieBridge>,
    api: ApiClient,
    status: watch::Sender<AuthStatus>,
}

impl AuthContext {
    #[must_use]
    pub fn new(api: ApiClient, bridge: Arc<CookieBridge>, routes: Arc<RouteTable>) -> Self {
        let (status, _) = watch::channel(AuthStatus::Loading);
        Self { scope: api.scope(), store: api.store().clone(), routes, bridge, api, status }
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.store.profile().await
    }

    /// Decide the status from a cookie-backed token and the stored profile.
    /// An expired or undecodable token logs the store out.
    pub async fn evaluate(&self, cookie_token: Option<&str>, now: i64) -> AuthStatus {
        let status = match cookie_token.filter(|t| !is_placeholder_token(t)) {
            None => AuthStatus::Unauthenticated,
            Some(token) => match decode_unverified(token) {
                Ok(claims) if claims.is_expired_at(now) => {
                    tracing::info!(exp = claims.exp, "session token expired");
                    self.store.logout().await;
                    AuthStatus::Unauthenticated
                }
                Ok(_) if self.store.profile().await.is_some() => AuthStatus::Authenticated,
                Ok(_) => AuthStatus::Unauthenticated,
                Err(e) => {
                    tracing::warn!(error = %e, "session token undecodable");
                    self.store.logout().await;
                    AuthStatus::Unauthenticated
                }
            },
        };
        self.status.send_replace(status);
        status
    }

    /// Resolve `Loading` from the cookie bridge and the stored session, then
    /// say where a visitor on `path` belongs.
    pub async fn bootstrap(&self, path: &str, now: i64) -> Navigation {
        match self.cookie_state().await {
            Some(read) if !read.verdict.is_authenticated() => {
                if self.store.snapshot().await != SessionSnapshot::default() {
                    tracing::info!("server rejected the session cookie; logging out");
                    self.store.logout().await;
                }
                self.status.send_replace(AuthStatus::Unauthenticated);
            }
            Some(read) => {
                let status = self.evaluate(read.token.as_deref(), now).await;
                if let (AuthStatus::Authenticated, SessionVerdict::Authenticated { role, .. }) = (status, read.verdict) {
                    self.sync_role_cookie(role).await;
                }
            }
            None => {
                tracing::warn!("cookie bridge unavailable; using stored session");
                let token = self.store.token().await;
                self.evaluate(token.as_deref(), now).await;
            }
        }
        self.navigation_for(path).await
    }

    /// Redirect rule for the current status on `path`.
    pub async fn navigation_for(&self, path: &str) -> Navigation {
        match self.status() {
            AuthStatus::Loading => Navigation::Stay,
            AuthStatus::Unauthenticated if self.guards(path) => Navigation::Push(self.login_path().to_owned()),
            AuthStatus::Authenticated if self.on_login_page(path) => Navigation::Push(self.home().await),
            _ => Navigation::Stay,
        }
    }

    /// Adopt a validated login and mirror it into cookies, token then role.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProfile`] when the profile or token is
    /// unusable; nothing is stored in that case.
    pub async fn login(&self, profile: Profile, token: String, path: &str) -> Result<Navigation, ClientError> {
        let login = LoginResponse { user: profile, token };
        login.validate()?;
        let role = login.user.role();
        self.adopt(login).await;

        let home = self.routes.home_for(role).to_owned();
        Ok(match self.scope {
            SessionScope::Client if self.on_login_page(path) => Navigation::Assign(home),
            SessionScope::Client => Navigation::Reload,
            SessionScope::Admin => Navigation::Push(home),
        })
    }

    /// Credential login against this scope's endpoint.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the call, or an invalid login payload.
    pub async fn login_with_credentials(&self, email: &str, password: &str, path: &str) -> Result<Navigation, ClientError> {
        let endpoint = match self.scope {
            SessionScope::Client => "/api/auth/login",
            SessionScope::Admin => "/api/admin/login",
        };
        let credentials = Credentials { email: email.trim().to_owned(), password: password.to_owned() };
        let response: LoginResponse = self.api.post_json(endpoint, &credentials, Auth::Anonymous).await?;
        self.login(response.user, response.token, path).await
    }

    /// Create an account and sign straight in.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; field errors come back through [`ClientError::fields`].
    pub async fn register(&self, request: &RegisterRequest, path: &str) -> Result<Navigation, ClientError> {
        let response: LoginResponse = self.api.post_json("/api/auth/register", request, Auth::Anonymous).await?;
        self.login(response.user, response.token, path).await
    }

    /// Drop the session locally and in cookies. The server call is best-effort.
    pub async fn logout(&self) -> Navigation {
        if let Err(e) = self.api.post_empty("/api/auth/logout", &serde_json::json!({}), Auth::Anonymous).await {
            tracing::debug!(error = %e, "server logout failed; clearing locally");
        }
        self.store.logout().await;
        self.bridge.clear(self.scope).await;
        self.status.send_replace(AuthStatus::Unauthenticated);
        Navigation::Push(self.login_path().to_owned())
    }

    /// Fetch the server's profile and adopt it if strictly newer than the
    /// cached one. Returns whether the cache changed.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the call, or an invalid profile payload.
    pub async fn reconcile_profile(&self) -> Result<bool, ClientError> {
        let epoch = self.store.epoch().await;
        let fresh: Profile = self.api.get_json("/api/auth/me", Auth::Bearer).await?;
        fresh.validate()?;
        let replaced = self.store.adopt_newer_profile(epoch, fresh).await;
        if replaced {
            tracing::debug!("cached profile replaced by newer server copy");
        }
        Ok(replaced)
    }

    /// Finish a third-party login whose redirect put `user` and `token` in
    /// the query. Returns the cleaned location to replace the current
    /// history entry with, or `None` when the URL carries no session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProfile`] for an unparseable `user`
    /// value or a placeholder token.
    pub async fn complete_social_login(&self, url: &Url) -> Result<Option<Navigation>, ClientError> {
        let mut user = None;
        let mut token = None;
        let mut kept = Vec::new();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "user" => user = Some(value.into_owned()),
                "token" => token = Some(value.into_owned()),
                _ => kept.push((key.into_owned(), value.into_owned())),
            }
        }
        let (Some(user), Some(token)) = (user, token) else {
            return Ok(None);
        };
        if is_placeholder_token(&token) {
            return Err(ProfileError::EmptyToken.into());
        }
        let profile = Profile::from_json(&user)?;
        self.adopt(LoginResponse { user: profile, token }).await;

        let mut clean = url.clone();
        clean.set_query(None);
        if !kept.is_empty() {
            clean.query_pairs_mut().extend_pairs(kept);
        }
        Ok(Some(Navigation::Replace(clean[Position::BeforePath..].to_owned())))
    }

    async fn adopt(&self, login: LoginResponse) {
        let role = login.user.role();
        self.store.establish(login.user, login.token.clone()).await;
        self.bridge.mirror_login(&login.token, role, self.scope).await;
        self.status.send_replace(AuthStatus::Authenticated);
        tracing::info!(role = role.as_str(), "session established");
    }

    /// Cookie state from the bridge. A fresh cookie jar with a persisted
    /// session gets the cookies restored before the verdict is read.
    async fn cookie_state(&self) -> Option<CookieTokenResponse> {
        let read = self.bridge.read_token(self.scope).await?;
        if read.token.is_some() {
            return Some(read);
        }
        let snapshot = self.store.snapshot().await;
        let (true, Some(token), Some(profile)) = (snapshot.is_authenticated, snapshot.token, snapshot.profile) else {
            return Some(read);
        };
        tracing::debug!("restoring session cookies from stored session");
        self.bridge.mirror_login(&token, profile.role(), self.scope).await;
        self.bridge.read_token(self.scope).await
    }

    /// Rewrite the role cookie when it is missing or disagrees with the
    /// role the server verified.
    async fn sync_role_cookie(&self, role: Role) {
        match self.bridge.read_role().await {
            Some(current) if current == role => {}
            current => {
                tracing::debug!(?current, role = role.as_str(), "role cookie out of date; rewriting");
                self.bridge.mirror_role(role).await;
            }
        }
    }

    fn guards(&self, path: &str) -> bool {
        !self.routes.is_excluded(path) && self.routes.area_for(path).is_some_and(|area| area.scope == self.scope)
    }

    fn login_path(&self) -> &str {
        self.routes.login_for(self.scope)
    }

    fn on_login_page(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        path == self.login_path()
    }

    async fn home(&self) -> String {
        match self.store.profile().await {
            Some(profile) => self.routes.home_for(profile.role()).to_owned(),
            None => self
                .routes
                .area_for_scope(self.scope)
                .map_or_else(|| "/".to_owned(), |area| area.home_path.clone()),
        }
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
