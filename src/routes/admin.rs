//! Admin moderation routes.

use axum::Json;
use axum::extract::{Path, Query, State};
use models::wire::SuspensionRequest;
use models::{AdminProfile, Claims, Profile, Role};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::{AuthClaims, load_account};
use crate::error::ApiError;
use crate::services::accounts::{self, UserSummary};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    #[must_use]
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Reject non-admin tokens before touching the database.
pub(crate) fn require_admin_claims(claims: &Claims) -> Result<(), ApiError> {
    if claims.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin access required"))
    }
}

async fn require_admin(state: &AppState, claims: &Claims) -> Result<AdminProfile, ApiError> {
    require_admin_claims(claims)?;
    match load_account(state, claims).await?.profile {
        Profile::Admin(admin) => Ok(admin),
        _ => Err(ApiError::Forbidden("admin access required")),
    }
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthClaims,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    require_admin(&state, &auth.claims).await?;
    let (limit, offset) = page.bounds();
    let users = accounts::list_users(&state.pool, limit, offset).await?;
    Ok(Json(users))
}

/// `PATCH /api/admin/users/{id}/suspension`
pub async fn set_suspension(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SuspensionRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let admin = require_admin(&state, &auth.claims).await?;
    if !admin.level.can_moderate() {
        return Err(ApiError::Forbidden("moderator access required"));
    }

    let summary = accounts::set_suspended(&state.pool, user_id, body.suspended)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;
    tracing::info!(admin_id = %admin.id, %user_id, suspended = body.suspended, "suspension updated");
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_are_clamped() {
        assert_eq!(PageQuery::default().bounds(), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(PageQuery { limit: Some(0), offset: Some(-4) }.bounds(), (1, 0));
        assert_eq!(PageQuery { limit: Some(10_000), offset: Some(20) }.bounds(), (MAX_PAGE_SIZE, 20));
    }

    #[test]
    fn non_admin_claims_are_forbidden() {
        let claims = Claims { sub: Uuid::nil(), role: Role::Agent, iat: 0, exp: 1 };
        assert!(matches!(require_admin_claims(&claims), Err(ApiError::Forbidden(_))));
        let admin = Claims { role: Role::Admin, ..claims };
        assert!(require_admin_claims(&admin).is_ok());
    }
}
