//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! API routes (auth, cookie bridge, admin moderation) sit under `/api`, the
//! OAuth round trip under `/auth`, and every other path falls through to the
//! static site behind the route guard. Token rotation wraps the API routes
//! except logout and the cookie bridge; the guard wraps everything but skips
//! excluded prefixes itself.

pub mod admin;
pub mod auth;
pub mod cookies;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use models::{REFRESH_TOKEN_HEADER, SESSION_STATE_HEADER};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{guard, rotate};

/// Routes whose successful responses may carry a rotated token.
fn rotated_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/login", post(auth::admin_login))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}/suspension", patch(admin::set_suspension))
        .route_layer(from_fn_with_state(state.clone(), rotate::refresh_token))
}

/// Logout and the cookie bridge manage the session cookies themselves and
/// never rotate.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/set-cookie", post(cookies::set_cookie))
        .route("/api/set-user-role", post(cookies::set_user_role))
        .route("/api/get-cookie", get(cookies::get_cookie))
        .route("/api/get-user-role", get(cookies::get_user_role))
        .route("/api/clear-cookie", post(cookies::clear_cookie))
}

/// Browser origin of the listing client, for credentialed CORS.
fn client_origin(client_url: &str) -> Option<HeaderValue> {
    let parsed = url::Url::parse(client_url).ok()?;
    HeaderValue::from_str(&parsed.origin().ascii_serialization()).ok()
}

fn cors(state: &AppState) -> CorsLayer {
    let origins = match client_origin(&state.config.client_url) {
        Some(origin) => vec![origin],
        None => {
            tracing::warn!(client_url = %state.config.client_url, "CLIENT_URL is not a valid origin; CORS disabled");
            Vec::new()
        }
    };
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static(REFRESH_TOKEN_HEADER),
            HeaderName::from_static(SESSION_STATE_HEADER),
        ])
        .allow_credentials(true)
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let site = ServeDir::new(&state.config.site_dir).append_index_html_on_directories(true);

    rotated_routes(&state)
        .merge(session_routes())
        .route("/auth/github", get(auth::github_redirect))
        .route("/auth/github/callback", get(auth::github_callback))
        .route("/healthz", get(healthz))
        .fallback_service(site)
        .layer(from_fn_with_state(state.clone(), guard::route_guard))
        .layer(cors(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
