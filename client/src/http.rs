//! HTTP Client Wrapper: every API call goes through [`ApiClient`].
//!
//! ARCHITECTURE
//! ============
//! One request is: capture session epoch, attach bearer token (or fail fast),
//! wait for a rate-limit slot, send, maybe retry once, then intercept.
//!
//! Interception handles the two session side effects a response can carry:
//! a rotated token in `x-refresh-token`, and a `Token error` rejection that
//! forces logout. Both are applied through the store's epoch-guarded
//! mutators, so a burst of rejected calls logs out once and a late response
//! from a previous session changes nothing.

use std::sync::Arc;

use models::claims::is_placeholder_token;
use models::{ErrorBody, REFRESH_TOKEN_HEADER, SessionScope, is_token_error};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::cookies::CookieBridge;
use crate::error::ClientError;
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryPolicy, is_idempotent, is_retryable_status};
use crate::store::TokenStore;

/// Whether a call carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Bearer,
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    store: Arc<TokenStore>,
    bridge: Arc<CookieBridge>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    scope: SessionScope,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        config: &ClientConfig,
        store: Arc<TokenStore>,
        bridge: Arc<CookieBridge>,
        scope: SessionScope,
    ) -> Self {
        Self {
            http,
            base: directory_url(config.api_base.clone()),
            store,
            bridge,
            limiter: RateLimiter::new(config.rate_limit),
            retry: config.retry,
            scope,
        }
    }

    #[must_use]
    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// # Errors
    ///
    /// Any [`ClientError`]; see [`ApiClient::send`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<T, ClientError> {
        let response = self.send(Method::GET, path, None, auth).await?;
        decode(response).await
    }

    /// # Errors
    ///
    /// Any [`ClientError`]; see [`ApiClient::send`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B, auth: Auth) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        let response = self.send(Method::POST, path, Some(&body), auth).await?;
        decode(response).await
    }

    /// POST whose success body is ignored.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; see [`ApiClient::send`].
    pub async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B, auth: Auth) -> Result<(), ClientError> {
        let body = encode(body)?;
        self.send(Method::POST, path, Some(&body), auth).await?;
        Ok(())
    }

    /// Send one call with rate limiting, retry and session interception.
    /// Returns only success responses.
    ///
    /// # Errors
    ///
    /// - [`ClientError::MissingToken`] for a bearer call without a usable token,
    ///   before any network I/O.
    /// - [`ClientError::SessionExpired`] when the server rejected the session.
    /// - [`ClientError::Api`] for any other non-success status.
    /// - [`ClientError::Transport`] when the request could not be completed.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        auth: Auth,
    ) -> Result<Response, ClientError> {
        let epoch = self.store.epoch().await;
        let token = match auth {
            Auth::Bearer => Some(self.bearer_token().await?),
            Auth::Anonymous => None,
        };
        let url = self.base.join(path.trim_start_matches('/'))?;

        let mut attempt = 0;
        let response = loop {
            self.limiter.acquire().await;
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(resp) if self.retry.allows(attempt) && is_retryable_status(&method, resp.status()) => {
                    tracing::debug!(%method, %path, status = %resp.status(), attempt, "retrying request");
                }
                Ok(resp) => break resp,
                Err(e) if self.retry.allows(attempt) && (e.is_connect() || is_idempotent(&method)) => {
                    tracing::warn!(%method, %path, error = %e, attempt, "request failed; retrying");
                }
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(self.retry.backoff(attempt)).await;
            attempt += 1;
        };

        self.intercept(epoch, path, response).await
    }

    async fn bearer_token(&self) -> Result<String, ClientError> {
        match self.store.token().await {
            Some(token) if !is_placeholder_token(&token) => Ok(token),
            _ => Err(ClientError::MissingToken),
        }
    }

    async fn intercept(&self, epoch: u64, path: &str, response: Response) -> Result<Response, ClientError> {
        let rotated = response
            .headers()
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !is_placeholder_token(t))
            .map(str::to_owned);
        if let Some(fresh) = rotated {
            if self.store.refresh_if_epoch(epoch, fresh.clone()).await {
                tracing::debug!(%path, "session token rotated");
                self.bridge.mirror_token(&fresh, self.scope).await;
            }
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = error_body(status, response).await;
        if is_token_error(&body.message) {
            if self.store.logout_if_epoch(epoch).await {
                tracing::info!(%path, %status, message = %body.message, "session rejected; logging out");
                self.bridge.clear(self.scope).await;
            }
            return Err(ClientError::SessionExpired);
        }
        Err(ClientError::Api { status: status.as_u16(), message: body.message, fields: body.fields })
    }
}

/// `Url::join` replaces the last segment unless the base ends in `/`.
fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::Encode(e.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Parse a JSON error body; plain text bodies become the message, and an
/// empty body falls back to the status reason.
async fn error_body(status: StatusCode, response: Response) -> ErrorBody {
    let bytes = response.bytes().await.unwrap_or_default();
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(&bytes) {
        return body;
    }
    let text = String::from_utf8_lossy(&bytes).trim().to_owned();
    if text.is_empty() {
        ErrorBody::new(status.canonical_reason().unwrap_or("request failed"))
    } else {
        ErrorBody::new(text)
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
