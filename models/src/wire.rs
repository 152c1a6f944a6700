//! Request and response bodies exchanged between the API and its clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::Role;
use crate::{ADMIN_TOKEN_COOKIE, TOKEN_COOKIE};

/// Which application a session belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionScope {
    /// The public listing client.
    #[default]
    Client,
    /// The administrative dashboard.
    Admin,
}

impl SessionScope {
    /// Name of the cookie that carries this scope's token.
    #[must_use]
    pub fn cookie_name(self) -> &'static str {
        match self {
            Self::Client => TOKEN_COOKIE,
            Self::Admin => ADMIN_TOKEN_COOKIE,
        }
    }
}

/// Result of server-side token verification, handed to the client so both
/// sides act on the same decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionVerdict {
    Authenticated { role: Role, expires_at: i64 },
    Unauthenticated,
}

impl SessionVerdict {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            Self::Authenticated { .. } => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

/// JSON error body. `fields` carries per-field validation messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), fields: BTreeMap::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCookieRequest {
    pub token: String,
    #[serde(default)]
    pub scope: SessionScope,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub scope: SessionScope,
}

/// `GET /api/get-cookie` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieTokenResponse {
    pub token: Option<String>,
    pub verdict: SessionVerdict,
}

/// `GET /api/get-user-role` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: Option<Role>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_register_role")]
    pub role: Role,
}

fn default_register_role() -> Role {
    Role::User
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionRequest {
    pub suspended: bool,
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
