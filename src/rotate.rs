//! Sliding session renewal.
//!
//! Authenticated API calls whose token is inside the refresh window get a
//! freshly signed replacement in `x-refresh-token`. The client swaps it in
//! silently; the old token stays valid until its own expiry.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use models::{Claims, REFRESH_TOKEN_HEADER, TOKEN_COOKIE};

use crate::services::token::{TokenIssuer, unix_now};
use crate::state::AppState;

/// Token presented by the caller: bearer header first, then the session cookie.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|t| !t.is_empty())
}

/// Claims worth renewing: valid now and expiring within `window_secs`.
#[must_use]
pub fn due_for_rotation(tokens: &TokenIssuer, token: &str, window_secs: i64, now: i64) -> Option<Claims> {
    let claims = tokens.verify(token, now).ok()?;
    (claims.remaining_secs(now) <= window_secs).then_some(claims)
}

pub async fn refresh_token(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let now = unix_now();
    let due = presented_token(req.headers())
        .and_then(|token| due_for_rotation(&state.tokens, &token, state.config.token_refresh_window_secs, now));

    let mut response = next.run(req).await;
    let Some(claims) = due else {
        return response;
    };
    if !response.status().is_success() {
        return response;
    }

    match state.tokens.rotate(&claims, now) {
        Ok(fresh) => match HeaderValue::from_str(&fresh) {
            Ok(value) => {
                tracing::debug!(sub = %claims.sub, "issued refresh token");
                response.headers_mut().insert(REFRESH_TOKEN_HEADER, value);
            }
            Err(e) => tracing::warn!(error = %e, "refresh token is not a valid header value"),
        },
        Err(e) => tracing::warn!(error = %e, "token rotation failed"),
    }
    response
}

#[cfg(test)]
#[path = "rotate_test.rs"]
mod tests;
