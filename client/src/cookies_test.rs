use super::*;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use models::SessionVerdict;

use crate::test_support::MockApi;

fn bridge_router() -> Router {
    Router::new()
        .route("/api/set-cookie", post(|| async { StatusCode::NO_CONTENT }))
        .route("/api/set-user-role", post(|| async { StatusCode::NO_CONTENT }))
        .route("/api/clear-cookie", post(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/api/get-cookie",
            get(|| async {
                Json(CookieTokenResponse {
                    token: Some("cookie-token".to_owned()),
                    verdict: SessionVerdict::Authenticated { role: Role::Agent, expires_at: 42 },
                })
            }),
        )
        .route("/api/get-user-role", get(|| async { Json(RoleResponse { role: Some(Role::Agent) }) }))
}

#[tokio::test]
async fn login_mirrors_token_then_role() {
    let mock = MockApi::start(bridge_router()).await;
    let bridge = CookieBridge::new(reqwest::Client::new(), mock.base.clone());

    bridge.mirror_login("t1", Role::Agent, SessionScope::Client).await;

    assert_eq!(mock.paths(), ["/api/set-cookie", "/api/set-user-role"]);
    let calls = mock.calls();
    let token_body: SetCookieRequest = serde_json::from_str(&calls[0].body).unwrap();
    assert_eq!(token_body, SetCookieRequest { token: "t1".to_owned(), scope: SessionScope::Client });
    let role_body: SetRoleRequest = serde_json::from_str(&calls[1].body).unwrap();
    assert_eq!(role_body.role, Role::Agent);
}

#[tokio::test]
async fn admin_scope_is_forwarded() {
    let mock = MockApi::start(bridge_router()).await;
    let bridge = CookieBridge::new(reqwest::Client::new(), mock.base.clone());

    bridge.mirror_token("t2", SessionScope::Admin).await;
    bridge.clear(SessionScope::Admin).await;

    let calls = mock.calls();
    assert!(calls[0].body.contains(r#""scope":"admin""#));
    assert_eq!(calls[1].path, "/api/clear-cookie");
    assert_eq!(calls[1].query.as_deref(), Some("scope=admin"));
}

#[tokio::test]
async fn reads_token_verdict_and_role() {
    let mock = MockApi::start(bridge_router()).await;
    let bridge = CookieBridge::new(reqwest::Client::new(), mock.base.clone());

    let read = bridge.read_token(SessionScope::Client).await.unwrap();
    assert_eq!(read.token.as_deref(), Some("cookie-token"));
    assert!(read.verdict.is_authenticated());
    assert_eq!(bridge.read_role().await, Some(Role::Agent));
}

#[tokio::test]
async fn unreachable_bridge_is_swallowed() {
    // Nothing listens on port 9 locally.
    let bridge = CookieBridge::new(reqwest::Client::new(), Url::parse("http://127.0.0.1:9").unwrap());
    bridge.mirror_login("t1", Role::User, SessionScope::Client).await;
    bridge.clear(SessionScope::Client).await;
    assert!(bridge.read_token(SessionScope::Client).await.is_none());
    assert!(bridge.read_role().await.is_none());
}

#[tokio::test]
async fn rejected_write_is_swallowed() {
    let mock = MockApi::start(Router::new().route(
        "/api/set-cookie",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;
    let bridge = CookieBridge::new(reqwest::Client::new(), mock.base.clone());
    bridge.mirror_login("t1", Role::User, SessionScope::Client).await;
    // The role write is still attempted after a failed token write.
    assert_eq!(mock.paths(), ["/api/set-cookie", "/api/set-user-role"]);
}
