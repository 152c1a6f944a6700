use super::*;
use std::collections::HashMap;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use models::{ADMIN_TOKEN_COOKIE, Role, TOKEN_COOKIE};
use tower::ServiceExt;

use crate::state::test_helpers::{TEST_SECRET, test_app_state, token_expiring_in, token_for};

fn issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_SECRET, 86_400)
}

fn run(path: &str, cookies: &HashMap<&str, String>) -> GuardDecision {
    decide(&RouteTable::default(), &issuer(), path, |name| cookies.get(name).map(String::as_str), unix_now())
}

fn valid(role: Role) -> String {
    issuer().issue(uuid::Uuid::new_v4(), role, unix_now()).unwrap()
}

fn redirect_to(path: &str) -> GuardAction {
    GuardAction::Redirect(path.to_owned())
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn excluded_paths_pass_without_verdict() {
    let none = HashMap::new();
    for path in ["/api/auth/me", "/auth/github", "/_next/data", "/static/app.css", "/pkg/app.wasm", "/healthz", "/favicon.ico"] {
        let decision = run(path, &none);
        assert_eq!(decision, GuardDecision::pass(None), "{path}");
    }
}

#[test]
fn protected_without_cookie_redirects_to_login() {
    let decision = run("/dashboard/listings", &HashMap::new());
    assert_eq!(decision.action, redirect_to("/"));
    assert_eq!(decision.verdict, Some(SessionVerdict::Unauthenticated));
}

#[test]
fn files_inside_protected_areas_are_guarded() {
    let none = HashMap::new();
    assert_eq!(run("/admin/index.html", &none).action, redirect_to("/admin-login"));
    assert_eq!(run("/dashboard/logo.png", &none).action, redirect_to("/"));

    let cookies = HashMap::from([(TOKEN_COOKIE, valid(Role::User))]);
    assert_eq!(run("/dashboard/logo.png", &cookies).action, GuardAction::Pass);
}

#[test]
fn protected_with_valid_cookie_passes() {
    let cookies = HashMap::from([(TOKEN_COOKIE, valid(Role::Agent))]);
    let decision = run("/dashboard", &cookies);
    assert_eq!(decision.action, GuardAction::Pass);
    assert!(decision.verdict.unwrap().is_authenticated());
}

#[test]
fn malformed_and_forged_tokens_are_treated_alike() {
    let forged = TokenIssuer::new("another-secret-that-is-also-32-bytes!!", 86_400)
        .issue(uuid::Uuid::new_v4(), Role::User, unix_now())
        .unwrap();
    for token in ["garbage".to_owned(), "a.b.c".to_owned(), forged] {
        let cookies = HashMap::from([(TOKEN_COOKIE, token)]);
        assert_eq!(run("/dashboard", &cookies).action, redirect_to("/"));
    }
}

#[test]
fn expired_cookie_redirects() {
    let expired = issuer()
        .issue(uuid::Uuid::new_v4(), Role::User, unix_now() - 90_000)
        .unwrap();
    let cookies = HashMap::from([(TOKEN_COOKIE, expired)]);
    assert_eq!(run("/dashboard", &cookies).action, redirect_to("/"));
}

#[test]
fn admin_area_uses_admin_cookie_and_role() {
    let member_in_admin_cookie = HashMap::from([(ADMIN_TOKEN_COOKIE, valid(Role::User))]);
    assert_eq!(run("/admin/users", &member_in_admin_cookie).action, redirect_to("/admin-login"));

    let client_cookie_only = HashMap::from([(TOKEN_COOKIE, valid(Role::Admin))]);
    assert_eq!(run("/admin", &client_cookie_only).action, redirect_to("/admin-login"));

    let admin = HashMap::from([(ADMIN_TOKEN_COOKIE, valid(Role::Admin))]);
    assert_eq!(run("/admin/users", &admin).action, GuardAction::Pass);
}

#[test]
fn admin_login_page_is_not_under_admin() {
    let decision = run("/admin-login", &HashMap::new());
    assert_eq!(decision.action, GuardAction::Pass);
}

#[test]
fn auth_only_page_redirects_signed_in_visitor_home() {
    let cookies = HashMap::from([(TOKEN_COOKIE, valid(Role::User))]);
    assert_eq!(run("/reset-password", &cookies).action, redirect_to("/dashboard"));

    let admin = HashMap::from([(ADMIN_TOKEN_COOKIE, valid(Role::Admin))]);
    assert_eq!(run("/forgot-password", &admin).action, redirect_to("/admin"));
}

#[test]
fn auth_only_page_passes_anonymous_visitor() {
    let decision = run("/reset-password?code=abc", &HashMap::new());
    assert_eq!(decision, GuardDecision::pass(Some(SessionVerdict::Unauthenticated)));
}

#[test]
fn public_pages_pass_with_verdict() {
    let cookies = HashMap::from([(TOKEN_COOKIE, valid(Role::User))]);
    let decision = run("/listings/lekki", &cookies);
    assert_eq!(decision.action, GuardAction::Pass);
    assert!(decision.verdict.unwrap().is_authenticated());
}

// =============================================================================
// middleware
// =============================================================================

fn guarded_app() -> Router {
    let state = test_app_state();
    Router::new()
        .route("/dashboard", get(|| async { "dashboard" }))
        .route("/", get(|| async { "home" }))
        .layer(axum::middleware::from_fn_with_state(state.clone(), route_guard))
        .with_state(state)
}

#[tokio::test]
async fn middleware_redirects_and_sets_header() {
    let response = guarded_app()
        .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get("location").unwrap(), "/");
    assert_eq!(response.headers().get(SESSION_STATE_HEADER).unwrap(), "unauthenticated");
}

#[tokio::test]
async fn middleware_passes_valid_cookie() {
    let state = test_app_state();
    let token = token_for(&state, Role::User);
    let response = guarded_app()
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .header("cookie", format!("{TOKEN_COOKIE}={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(SESSION_STATE_HEADER).unwrap(), "authenticated");
}

#[tokio::test]
async fn middleware_rejects_token_that_expired_a_moment_ago() {
    let state = test_app_state();
    let token = token_expiring_in(&state, Role::User, -1);
    let response = guarded_app()
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .header("cookie", format!("{TOKEN_COOKIE}={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}
