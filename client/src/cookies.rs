//! Cookie Bridge: mirrors the session into the app origin's HttpOnly
//! cookies through the same-origin bridge endpoints, so the server-side
//! route guard sees what the client sees.
//!
//! Every failure here is logged and swallowed. The in-memory session stays
//! authoritative for the current process.

use models::wire::{CookieTokenResponse, RoleResponse, SetCookieRequest, SetRoleRequest};
use models::{Role, SessionScope};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Debug, Clone)]
pub struct CookieBridge {
    http: reqwest::Client,
    origin: Url,
}

impl CookieBridge {
    #[must_use]
    pub fn new(http: reqwest::Client, origin: Url) -> Self {
        Self { http, origin }
    }

    /// Mirror a fresh login: token cookie first, then role cookie. Both are
    /// awaited, so the guard never sees a token without its role.
    pub async fn mirror_login(&self, token: &str, role: Role, scope: SessionScope) {
        self.mirror_token(token, scope).await;
        self.mirror_role(role).await;
    }

    pub async fn mirror_role(&self, role: Role) {
        self.post("api/set-user-role", None, &SetRoleRequest { role }).await;
    }

    /// Mirror a token alone, e.g. after rotation.
    pub async fn mirror_token(&self, token: &str, scope: SessionScope) {
        self.post("api/set-cookie", None, &SetCookieRequest { token: token.to_owned(), scope })
            .await;
    }

    /// Expire the scope's session cookie and the role cookie.
    pub async fn clear(&self, scope: SessionScope) {
        self.post("api/clear-cookie", Some(scope), &serde_json::json!({})).await;
    }

    /// Current cookie token plus the server's verdict on it. `None` when the
    /// bridge cannot be reached.
    pub async fn read_token(&self, scope: SessionScope) -> Option<CookieTokenResponse> {
        self.get("api/get-cookie", Some(scope)).await
    }

    pub async fn read_role(&self) -> Option<Role> {
        self.get::<RoleResponse>("api/get-user-role", None)
            .await
            .and_then(|r| r.role)
    }

    fn url(&self, path: &str, scope: Option<SessionScope>) -> Option<Url> {
        let mut url = match self.origin.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%path, error = %e, "cookie bridge url invalid");
                return None;
            }
        };
        if let Some(scope) = scope {
            let value = match scope {
                SessionScope::Client => "client",
                SessionScope::Admin => "admin",
            };
            url.query_pairs_mut().append_pair("scope", value);
        }
        Some(url)
    }

    async fn post<B: Serialize>(&self, path: &str, scope: Option<SessionScope>, body: &B) {
        let Some(url) = self.url(path, scope) else {
            return;
        };
        match self.http.post(url).json(body).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(%path, "cookie bridge write ok");
            }
            Ok(resp) => tracing::warn!(%path, status = %resp.status(), "cookie bridge write rejected"),
            Err(e) => tracing::warn!(%path, error = %e, "cookie bridge write failed"),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, scope: Option<SessionScope>) -> Option<T> {
        let url = self.url(path, scope)?;
        let resp = match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(%path, status = %resp.status(), "cookie bridge read rejected");
                return None;
            }
            Err(e) => {
                tracing::warn!(%path, error = %e, "cookie bridge read failed");
                return None;
            }
        };
        resp.json::<T>()
            .await
            .inspect_err(|e| tracing::warn!(%path, error = %e, "cookie bridge read undecodable"))
            .ok()
    }
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
