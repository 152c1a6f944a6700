//! Account persistence for members, agents, and administrators.
//!
//! ARCHITECTURE
//! ============
//! `users` holds members and agents (both log in through the listing client);
//! `admins` holds back-office staff. Rows are mapped straight into the
//! role-tagged `models::Profile`, so a row that cannot form a valid profile
//! surfaces as `AccountError::Corrupt` instead of leaking half-filled JSON.

use models::{AdminLevel, AdminProfile, AgentProfile, Claims, MemberProfile, Profile, Role};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, phone, avatar_url, password_hash, role, agency, verified, \
                            suspended, credentials_changed_at, created_at, updated_at";
const ADMIN_COLUMNS: &str = "id, name, email, password_hash, level, suspended, credentials_changed_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("email already registered")]
    EmailTaken,
    #[error("corrupt account row: {0}")]
    Corrupt(String),
}

/// An account row plus the fields the auth layer needs beyond the profile.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub profile: Profile,
    pub password_hash: Option<String>,
    pub suspended: bool,
    pub credentials_changed_at: OffsetDateTime,
}

/// Why an otherwise valid token no longer grants a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revocation {
    Suspended,
    CredentialsChanged,
}

impl Revocation {
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Suspended => "account suspended",
            Self::CredentialsChanged => "credentials changed since token was issued",
        }
    }
}

impl AccountRecord {
    /// Check a verified token against the live account state.
    #[must_use]
    pub fn revocation(&self, claims: &Claims) -> Option<Revocation> {
        if self.suspended {
            return Some(Revocation::Suspended);
        }
        if claims.iat < self.credentials_changed_at.unix_timestamp() {
            return Some(Revocation::CredentialsChanged);
        }
        None
    }
}

/// Row shown in the admin moderation list.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub profile: Profile,
    pub suspended: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields accepted when registering through the listing client.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub password_hash: String,
}

/// GitHub identity used to upsert a social-login account.
#[derive(Debug, Clone)]
pub struct SocialIdentity {
    pub github_id: i64,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

// =============================================================================
// ROW MAPPING
// =============================================================================

fn user_from_row(row: &PgRow) -> Result<AccountRecord, AccountError> {
    let role: String = row.try_get("role")?;
    let id: Uuid = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let email: String = row.try_get("email")?;
    let phone: Option<String> = row.try_get("phone")?;
    let avatar_url: Option<String> = row.try_get("avatar_url")?;
    let updated_at: OffsetDateTime = row.try_get("updated_at")?;

    let profile = match role.as_str() {
        "user" => Profile::User(MemberProfile { id, name, email, phone, avatar_url, updated_at }),
        "agent" => Profile::Agent(AgentProfile {
            id,
            name,
            email,
            phone,
            avatar_url,
            agency: row.try_get("agency")?,
            verified: row.try_get("verified")?,
            updated_at,
        }),
        other => return Err(AccountError::Corrupt(format!("user {id} has role {other:?}"))),
    };

    Ok(AccountRecord {
        profile,
        password_hash: row.try_get("password_hash")?,
        suspended: row.try_get("suspended")?,
        credentials_changed_at: row.try_get("credentials_changed_at")?,
    })
}

fn admin_from_row(row: &PgRow) -> Result<AccountRecord, AccountError> {
    let id: Uuid = row.try_get("id")?;
    let level_raw: String = row.try_get("level")?;
    let level: AdminLevel = level_raw
        .parse()
        .map_err(|_| AccountError::Corrupt(format!("admin {id} has level {level_raw:?}")))?;

    Ok(AccountRecord {
        profile: Profile::Admin(AdminProfile {
            id,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            level,
            updated_at: row.try_get("updated_at")?,
        }),
        password_hash: Some(row.try_get("password_hash")?),
        suspended: row.try_get("suspended")?,
        credentials_changed_at: row.try_get("credentials_changed_at")?,
    })
}

fn summary_from_row(row: &PgRow) -> Result<UserSummary, AccountError> {
    let record = user_from_row(row)?;
    Ok(UserSummary {
        profile: record.profile,
        suspended: record.suspended,
        created_at: row.try_get("created_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

// =============================================================================
// QUERIES
// =============================================================================

/// Look up a member or agent by normalized email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<AccountRecord>, AccountError> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Look up an administrator by normalized email.
pub async fn find_admin_by_email(pool: &PgPool, email: &str) -> Result<Option<AccountRecord>, AccountError> {
    let row = sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(admin_from_row).transpose()
}

/// Resolve the account a verified token refers to.
pub async fn find_by_claims(pool: &PgPool, claims: &Claims) -> Result<Option<AccountRecord>, AccountError> {
    let row = if claims.role == Role::Admin {
        sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"))
            .bind(claims.sub)
            .fetch_optional(pool)
            .await?
    } else {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(claims.sub)
            .fetch_optional(pool)
            .await?
    };
    match row {
        Some(row) if claims.role == Role::Admin => admin_from_row(&row).map(Some),
        Some(row) => user_from_row(&row).map(Some),
        None => Ok(None),
    }
}

/// Insert a new member or agent.
pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<AccountRecord, AccountError> {
    let result = sqlx::query(&format!(
        "INSERT INTO users (name, email, phone, role, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.phone)
    .bind(new_user.role.as_str())
    .bind(&new_user.password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => user_from_row(&row),
        Err(e) if is_unique_violation(&e) => Err(AccountError::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

/// Upsert a member from a GitHub identity.
pub async fn upsert_social_user(pool: &PgPool, identity: &SocialIdentity) -> Result<AccountRecord, AccountError> {
    let row = sqlx::query(&format!(
        "INSERT INTO users (github_id, name, email, avatar_url)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (github_id) DO UPDATE
             SET name = EXCLUDED.name, avatar_url = EXCLUDED.avatar_url, updated_at = now()
         RETURNING {USER_COLUMNS}"
    ))
    .bind(identity.github_id)
    .bind(&identity.name)
    .bind(&identity.email)
    .bind(&identity.avatar_url)
    .fetch_one(pool)
    .await;

    match row {
        Ok(row) => user_from_row(&row),
        Err(e) if is_unique_violation(&e) => Err(AccountError::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

/// Page through members and agents, newest first.
pub async fn list_users(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<UserSummary>, AccountError> {
    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(summary_from_row).collect()
}

/// Suspend or reinstate a member. Returns `None` if no such user exists.
pub async fn set_suspended(pool: &PgPool, user_id: Uuid, suspended: bool) -> Result<Option<UserSummary>, AccountError> {
    let row = sqlx::query(&format!(
        "UPDATE users SET suspended = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(suspended)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(summary_from_row).transpose()
}

/// Create the bootstrap administrator if no admin with this email exists.
pub async fn ensure_admin(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
    level: AdminLevel,
) -> Result<bool, AccountError> {
    let result = sqlx::query(
        "INSERT INTO admins (email, name, password_hash, level)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(level.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;
