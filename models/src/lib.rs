//! Shared session and identity model for the realty API and its clients.
//!
//! This crate owns the wire representation used by both the `realty` server
//! and the `client` library: role-tagged profiles, JWT claims, the cookie
//! bridge payloads, and the route table that decides which paths require a
//! session. Keeping them here means the server guard and the client auth
//! context evaluate exactly the same rules.

pub mod claims;
pub mod format;
pub mod profile;
pub mod routes;
pub mod wire;

pub use claims::{Claims, TokenError};
pub use profile::{AdminLevel, AdminProfile, AgentProfile, LoginResponse, MemberProfile, Profile, ProfileError, Role};
pub use routes::{ProtectedArea, RouteTable};
pub use wire::{ErrorBody, SessionScope, SessionVerdict};

/// Cookie holding the client-app session token.
pub const TOKEN_COOKIE: &str = "token";
/// Cookie holding the admin-dashboard session token.
pub const ADMIN_TOKEN_COOKIE: &str = "admin_user";
/// Cookie holding the role string of the current session.
pub const ROLE_COOKIE: &str = "role";
/// Lifetime of every session cookie.
pub const COOKIE_MAX_AGE_SECS: i64 = 86_400;

/// Response header carrying a rotated session token.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
/// Response header carrying the guard's verification verdict for a page.
pub const SESSION_STATE_HEADER: &str = "x-session-state";

/// Substring the server places in error messages that must end the session.
pub const TOKEN_ERROR_MARKER: &str = "Token error";

/// True when an error message asks the client to drop its session.
#[must_use]
pub fn is_token_error(message: &str) -> bool {
    message
        .to_ascii_lowercase()
        .contains(&TOKEN_ERROR_MARKER.to_ascii_lowercase())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
