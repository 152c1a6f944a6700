//! Auth routes: credential and GitHub login, profile lookup, logout.

use axum::Json;
use axum::extract::{FromRef, FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use models::claims::is_placeholder_token;
use models::wire::{Credentials, RegisterRequest};
use models::{ADMIN_TOKEN_COOKIE, Claims, LoginResponse, Profile, ROLE_COOKIE, Role, TOKEN_COOKIE};
use serde::Deserialize;
use time::Duration;

use super::cookies::expired_cookie;
use crate::error::ApiError;
use crate::rotate::presented_token;
use crate::services::accounts::{self, AccountRecord, NewUser};
use crate::services::password::{self, MIN_PASSWORD_LEN};
use crate::services::{github, token::unix_now};
use crate::state::AppState;

const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Verified token claims. Use as a handler parameter to require a session.
///
/// Checks signature and expiry only; handlers that need the live account
/// call [`load_account`] to also apply suspension and credential changes.
pub struct AuthClaims {
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AuthClaims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = presented_token(&parts.headers)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(ADMIN_TOKEN_COOKIE)
                    .map(|c| c.value().to_owned())
            })
            .filter(|t| !is_placeholder_token(t))
            .ok_or_else(|| ApiError::Token("missing session token".to_owned()))?;

        let app_state = AppState::from_ref(state);
        let claims = app_state.tokens.verify(&token, unix_now())?;
        Ok(Self { claims })
    }
}

/// Resolve the account behind verified claims, rejecting revoked sessions.
pub async fn load_account(state: &AppState, claims: &Claims) -> Result<AccountRecord, ApiError> {
    let record = accounts::find_by_claims(&state.pool, claims)
        .await?
        .ok_or_else(|| ApiError::Token("account no longer exists".to_owned()))?;
    if let Some(revocation) = record.revocation(claims) {
        tracing::info!(sub = %claims.sub, reason = revocation.reason(), "session revoked");
        return Err(revocation.into());
    }
    Ok(record)
}

// =============================================================================
// HELPERS
// =============================================================================

fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut fields = std::collections::BTreeMap::new();
    if req.name.trim().is_empty() {
        fields.insert("name".to_owned(), "name is required".to_owned());
    }
    let email = req.email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        fields.insert("email".to_owned(), "enter a valid email address".to_owned());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        fields.insert("password".to_owned(), format!("password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    if req.role == Role::Admin {
        fields.insert("role".to_owned(), "role must be user or agent".to_owned());
    }
    if fields.is_empty() { Ok(()) } else { Err(ApiError::Validation(fields)) }
}

/// Argon2 runs on the blocking pool.
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn issue_login(state: &AppState, profile: Profile) -> Result<LoginResponse, ApiError> {
    let token = state
        .tokens
        .issue(profile.id(), profile.role(), unix_now())
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(LoginResponse { user: profile, token })
}

async fn check_credentials(record: Option<AccountRecord>, password: String) -> Result<AccountRecord, ApiError> {
    let Some(record) = record else {
        return Err(ApiError::InvalidCredentials);
    };
    // Social-only accounts have no password to match.
    let Some(hash) = record.password_hash.clone() else {
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_blocking(password, hash).await? {
        return Err(ApiError::InvalidCredentials);
    }
    if record.suspended {
        return Err(ApiError::Forbidden("account suspended"));
    }
    Ok(record)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    validate_registration(&req)?;
    let password_hash = hash_blocking(req.password).await?;
    let record = accounts::create_user(
        &state.pool,
        &NewUser {
            name: req.name.trim().to_owned(),
            email: normalize_email(&req.email),
            phone: req.phone.filter(|p| !p.trim().is_empty()),
            role: req.role,
            password_hash,
        },
    )
    .await?;
    tracing::info!(user_id = %record.profile.id(), role = %record.profile.role(), "account registered");
    Ok((StatusCode::CREATED, Json(issue_login(&state, record.profile)?)))
}

/// `POST /api/auth/login`: members and agents.
pub async fn login(State(state): State<AppState>, Json(creds): Json<Credentials>) -> Result<Json<LoginResponse>, ApiError> {
    let record = accounts::find_user_by_email(&state.pool, &normalize_email(&creds.email)).await?;
    let record = check_credentials(record, creds.password).await?;
    tracing::info!(user_id = %record.profile.id(), "login");
    Ok(Json(issue_login(&state, record.profile)?))
}

/// `POST /api/admin/login`: back-office staff.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let record = accounts::find_admin_by_email(&state.pool, &normalize_email(&creds.email)).await?;
    let record = check_credentials(record, creds.password).await?;
    tracing::info!(admin_id = %record.profile.id(), "admin login");
    Ok(Json(issue_login(&state, record.profile)?))
}

/// `GET /api/auth/me`: the current, freshly loaded profile.
pub async fn me(State(state): State<AppState>, auth: AuthClaims) -> Result<Json<Profile>, ApiError> {
    let record = load_account(&state, &auth.claims).await?;
    Ok(Json(record.profile))
}

/// `POST /api/auth/logout`: clear every session cookie. Tokens are
/// stateless, so there is nothing to delete server-side.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let secure = state.cookie_secure();
    let jar = jar
        .add(expired_cookie(TOKEN_COOKIE, secure))
        .add(expired_cookie(ADMIN_TOKEN_COOKIE, secure))
        .add(expired_cookie(ROLE_COOKIE, secure));
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /auth/github`: redirect to GitHub authorization page.
pub async fn github_redirect(State(state): State<AppState>) -> Result<Response, ApiError> {
    let config = state
        .github
        .as_ref()
        .ok_or(ApiError::Unavailable("GitHub OAuth not configured"))?;

    let oauth_state = github::generate_state();
    let cookie = Cookie::build((OAUTH_STATE_COOKIE_NAME, oauth_state.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure())
        .max_age(Duration::minutes(10));

    let jar = CookieJar::new().add(cookie);
    Ok((jar, Redirect::temporary(&config.authorize_url(&oauth_state))).into_response())
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: Option<String>,
}

/// Where the listing client picks up a social login.
pub fn social_redirect_url(client_url: &str, login: &LoginResponse) -> Result<String, ApiError> {
    let user = serde_json::to_string(&login.user).map_err(|e| ApiError::Internal(e.to_string()))?;
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("user", &user)
        .append_pair("token", &login.token)
        .finish();
    Ok(format!("{client_url}/?{query}"))
}

/// `GET /auth/github/callback`: exchange code, upsert user, hand the session
/// to the listing client through the redirect query.
pub async fn github_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let config = state
        .github
        .as_ref()
        .ok_or(ApiError::Unavailable("GitHub OAuth not configured"))?;

    // Verify OAuth CSRF state from cookie.
    let callback_state = params
        .state
        .as_deref()
        .ok_or_else(|| ApiError::field("state", "missing oauth state"))?;
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE_NAME)
        .map(Cookie::value)
        .unwrap_or_default();
    if expected_state.is_empty() || expected_state != callback_state {
        return Err(ApiError::Forbidden("invalid oauth state"));
    }

    let access_token = github::exchange_code(&state.http, config, &params.code)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "oauth code exchange failed");
            ApiError::BadGateway("OAuth code exchange failed")
        })?;

    let gh_user = github::fetch_user(&state.http, &access_token).await.map_err(|e| {
        tracing::error!(error = %e, "github user fetch failed");
        ApiError::BadGateway("Failed to fetch GitHub profile")
    })?;

    let record = accounts::upsert_social_user(&state.pool, &gh_user.into_identity()).await?;
    if record.suspended {
        return Err(ApiError::Forbidden("account suspended"));
    }
    tracing::info!(user_id = %record.profile.id(), "github login");

    let login = issue_login(&state, record.profile)?;
    let target = social_redirect_url(&state.config.client_url, &login)?;

    let jar = jar.add(expired_cookie(OAUTH_STATE_COOKIE_NAME, state.cookie_secure()));
    Ok((jar, Redirect::temporary(&target)).into_response())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
