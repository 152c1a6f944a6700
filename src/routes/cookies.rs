//! Cookie bridge: same-origin endpoints that mirror the client session into
//! HttpOnly cookies so the route guard can see it on page requests.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use models::claims::is_placeholder_token;
use models::wire::{CookieTokenResponse, RoleResponse, ScopeQuery, SetCookieRequest, SetRoleRequest};
use models::{COOKIE_MAX_AGE_SECS, ROLE_COOKIE, Role, SessionScope, SessionVerdict};
use time::{Duration, OffsetDateTime};

use crate::error::ApiError;
use crate::services::token::unix_now;
use crate::state::AppState;

/// Session-scoped cookie with the attributes every bridge cookie shares.
#[must_use]
pub fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .max_age(Duration::seconds(COOKIE_MAX_AGE_SECS))
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(secure)
        .build()
}

/// Overwrite `name` with an already-expired value.
#[must_use]
pub fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(secure)
        .build()
}

/// Server-side verdict for the cookie of `scope`.
fn scope_verdict(state: &AppState, scope: SessionScope, token: Option<&str>) -> SessionVerdict {
    let Some(token) = token else {
        return SessionVerdict::Unauthenticated;
    };
    let Ok(claims) = state.tokens.verify(token, unix_now()) else {
        return SessionVerdict::Unauthenticated;
    };
    let admitted = state
        .routes
        .area_for_scope(scope)
        .is_none_or(|area| area.admits(claims.role));
    if admitted {
        SessionVerdict::Authenticated { role: claims.role, expires_at: claims.exp }
    } else {
        SessionVerdict::Unauthenticated
    }
}

/// `POST /api/set-cookie`: store the session token for a scope.
pub async fn set_cookie(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SetCookieRequest>,
) -> Result<(CookieJar, StatusCode), ApiError> {
    if is_placeholder_token(&body.token) {
        return Err(ApiError::field("token", "token is required"));
    }
    let cookie = session_cookie(body.scope.cookie_name(), body.token, state.cookie_secure());
    Ok((jar.add(cookie), StatusCode::NO_CONTENT))
}

/// `POST /api/set-user-role`: store the role string.
pub async fn set_user_role(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SetRoleRequest>,
) -> (CookieJar, StatusCode) {
    let cookie = session_cookie(ROLE_COOKIE, body.role.as_str().to_owned(), state.cookie_secure());
    (jar.add(cookie), StatusCode::NO_CONTENT)
}

/// `GET /api/get-cookie`: raw token plus the server's verdict on it.
pub async fn get_cookie(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ScopeQuery>,
) -> Json<CookieTokenResponse> {
    let token = jar
        .get(query.scope.cookie_name())
        .map(|c| c.value().to_owned())
        .filter(|t| !is_placeholder_token(t));
    let verdict = scope_verdict(&state, query.scope, token.as_deref());
    Json(CookieTokenResponse { token, verdict })
}

/// `GET /api/get-user-role`
pub async fn get_user_role(jar: CookieJar) -> Json<RoleResponse> {
    let role = jar
        .get(ROLE_COOKIE)
        .and_then(|c| c.value().parse::<Role>().ok());
    Json(RoleResponse { role })
}

/// `POST /api/clear-cookie`: expire the scope's session cookie and the role.
pub async fn clear_cookie(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ScopeQuery>,
) -> (CookieJar, StatusCode) {
    let secure = state.cookie_secure();
    let jar = jar
        .add(expired_cookie(query.scope.cookie_name(), secure))
        .add(expired_cookie(ROLE_COOKIE, secure));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
