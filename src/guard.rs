//! Route guard middleware for page requests.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs in front of every non-API page. It reads the session cookie for the
//! area a path belongs to, verifies signature and expiry, and either passes
//! the request through or redirects. Every guarded response carries the
//! verdict in `x-session-state`, which the client adopts as the single source
//! of truth instead of re-deciding on its own.
//!
//! Verification failures of every kind collapse into "not authenticated".

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use models::{ProtectedArea, RouteTable, SESSION_STATE_HEADER, SessionVerdict};

use crate::services::token::{TokenIssuer, unix_now};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    Pass,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDecision {
    pub action: GuardAction,
    /// `None` for excluded paths, which get no session header.
    pub verdict: Option<SessionVerdict>,
}

impl GuardDecision {
    fn pass(verdict: Option<SessionVerdict>) -> Self {
        Self { action: GuardAction::Pass, verdict }
    }
}

/// Verify the cookie for `area`; anything short of a valid token whose role
/// the area admits is `Unauthenticated`.
fn area_verdict<'a, F>(tokens: &TokenIssuer, area: &ProtectedArea, cookie: &F, now: i64) -> SessionVerdict
where
    F: Fn(&str) -> Option<&'a str>,
{
    let Some(token) = cookie(area.scope.cookie_name()) else {
        return SessionVerdict::Unauthenticated;
    };
    match tokens.verify(token, now) {
        Ok(claims) if area.admits(claims.role) => SessionVerdict::Authenticated { role: claims.role, expires_at: claims.exp },
        Ok(claims) => {
            tracing::debug!(role = %claims.role, area = %area.prefix, "token role not admitted");
            SessionVerdict::Unauthenticated
        }
        Err(e) => {
            tracing::debug!(error = %e, area = %area.prefix, "session cookie rejected");
            SessionVerdict::Unauthenticated
        }
    }
}

/// Decide what to do with a page request. Pure apart from the cookie lookup.
pub fn decide<'a, F>(routes: &RouteTable, tokens: &TokenIssuer, path: &str, cookie: F, now: i64) -> GuardDecision
where
    F: Fn(&str) -> Option<&'a str>,
{
    if routes.is_excluded(path) {
        return GuardDecision::pass(None);
    }

    if let Some(area) = routes.area_for(path) {
        let verdict = area_verdict(tokens, area, &cookie, now);
        let action = if verdict.is_authenticated() {
            GuardAction::Pass
        } else {
            GuardAction::Redirect(area.login_path.clone())
        };
        return GuardDecision { action, verdict: Some(verdict) };
    }

    // First area whose cookie verifies decides both the header and, for
    // auth-only pages, where to send the visitor.
    let signed_in = routes.areas.iter().find_map(|area| {
        let verdict = area_verdict(tokens, area, &cookie, now);
        verdict.is_authenticated().then_some((area, verdict))
    });

    match signed_in {
        Some((area, verdict)) if routes.is_auth_only(path) => {
            GuardDecision { action: GuardAction::Redirect(area.home_path.clone()), verdict: Some(verdict) }
        }
        Some((_, verdict)) => GuardDecision::pass(Some(verdict)),
        None => GuardDecision::pass(Some(SessionVerdict::Unauthenticated)),
    }
}

/// Axum middleware wrapper around [`decide`].
pub async fn route_guard(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let jar = CookieJar::from_headers(req.headers());
    let decision = decide(
        &state.routes,
        &state.tokens,
        &path,
        |name| jar.get(name).map(|c| c.value()),
        unix_now(),
    );

    let mut response = match &decision.action {
        GuardAction::Pass => next.run(req).await,
        GuardAction::Redirect(to) => {
            tracing::info!(%path, redirect = %to, "route guard redirect");
            Redirect::temporary(to).into_response()
        }
    };

    if let Some(verdict) = &decision.verdict {
        response
            .headers_mut()
            .insert(SESSION_STATE_HEADER, HeaderValue::from_static(verdict.as_header_value()));
    }
    response
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
