//! Role-tagged identity snapshots.
//!
//! DESIGN
//! ======
//! A profile is cached client-side next to the session token, so every field
//! a role can carry is spelled out per variant. Payloads that do not match a
//! variant exactly are rejected at deserialization, and `validate` catches
//! values that parse but are unusable (blank names, malformed emails).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ROLE
// =============================================================================

/// Role of an authenticated identity. The lowercase form is the wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            other => Err(ProfileError::UnknownRole(other.to_owned())),
        }
    }
}

/// Moderation rights of an administrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    Super,
    Moderator,
    Viewer,
}

impl AdminLevel {
    /// Whether this admin may change another account's status.
    #[must_use]
    pub fn can_moderate(self) -> bool {
        matches!(self, Self::Super | Self::Moderator)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Super => "super",
            Self::Moderator => "moderator",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for AdminLevel {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super" => Ok(Self::Super),
            "moderator" => Ok(Self::Moderator),
            "viewer" => Ok(Self::Viewer),
            other => Err(ProfileError::UnknownAdminLevel(other.to_owned())),
        }
    }
}

// =============================================================================
// PROFILE VARIANTS
// =============================================================================

/// A buyer or renter browsing listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A listing agent. Agents publish properties and receive contact messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A back-office administrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub level: AdminLevel,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Cached snapshot of the authenticated identity, tagged by `role`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    User(MemberProfile),
    Agent(AgentProfile),
    Admin(AdminProfile),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile name is empty")]
    EmptyName,
    #[error("profile email is invalid: {0}")]
    InvalidEmail(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown admin level: {0}")]
    UnknownAdminLevel(String),
    #[error("login response carries an empty token")]
    EmptyToken,
    #[error("malformed profile payload: {0}")]
    Malformed(String),
}

impl Profile {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::User(_) => Role::User,
            Self::Agent(_) => Role::Agent,
            Self::Admin(_) => Role::Admin,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(p) => p.id,
            Self::Agent(p) => p.id,
            Self::Admin(p) => p.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User(p) => &p.name,
            Self::Agent(p) => &p.name,
            Self::Admin(p) => &p.name,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::User(p) => &p.email,
            Self::Agent(p) => &p.email,
            Self::Admin(p) => &p.email,
        }
    }

    #[must_use]
    pub fn updated_at(&self) -> OffsetDateTime {
        match self {
            Self::User(p) => p.updated_at,
            Self::Agent(p) => p.updated_at,
            Self::Admin(p) => p.updated_at,
        }
    }

    /// True when `self` was updated strictly after `cached`.
    #[must_use]
    pub fn is_newer_than(&self, cached: &Profile) -> bool {
        self.updated_at() > cached.updated_at()
    }

    /// Reject profiles that deserialize but cannot identify anyone.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::EmptyName`] or [`ProfileError::InvalidEmail`].
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name().trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if !plausible_email(self.email()) {
            return Err(ProfileError::InvalidEmail(self.email().to_owned()));
        }
        Ok(())
    }

    /// Parse and validate a JSON-encoded profile, e.g. a redirect query value.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Malformed`] for JSON that does not match any
    /// role variant, or the [`Profile::validate`] error.
    pub fn from_json(raw: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(raw).map_err(|e| ProfileError::Malformed(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }
}

fn plausible_email(email: &str) -> bool {
    let trimmed = email.trim();
    let mut parts = trimmed.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

/// Body returned by every successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: Profile,
    pub token: String,
}

impl LoginResponse {
    /// # Errors
    ///
    /// Returns [`ProfileError::EmptyToken`] or the profile validation error.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.token.trim().is_empty() {
            return Err(ProfileError::EmptyToken);
        }
        self.user.validate()
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
