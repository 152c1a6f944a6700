//! Which paths need a session, and where to send visitors who lack one.
//!
//! The server route guard and the client auth context both consult a
//! [`RouteTable`], so a path is protected on one side exactly when it is
//! protected on the other.

use crate::profile::Role;
use crate::wire::SessionScope;

/// A path prefix that requires a verified session of a given scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedArea {
    pub scope: SessionScope,
    pub prefix: String,
    pub login_path: String,
    pub home_path: String,
    /// When set, the verified token must carry this role.
    pub required_role: Option<Role>,
}

impl ProtectedArea {
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        is_under(path, &self.prefix)
    }

    #[must_use]
    pub fn admits(&self, role: Role) -> bool {
        self.required_role.is_none_or(|required| required == role)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    pub areas: Vec<ProtectedArea>,
    /// Pages only meaningful without a session (password reset and friends).
    pub auth_only: Vec<String>,
    /// Prefixes the guard never inspects.
    pub excluded: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            areas: vec![
                ProtectedArea {
                    scope: SessionScope::Client,
                    prefix: "/dashboard".to_owned(),
                    login_path: "/".to_owned(),
                    home_path: "/dashboard".to_owned(),
                    required_role: None,
                },
                ProtectedArea {
                    scope: SessionScope::Admin,
                    prefix: "/admin".to_owned(),
                    login_path: "/admin-login".to_owned(),
                    home_path: "/admin".to_owned(),
                    required_role: Some(Role::Admin),
                },
            ],
            auth_only: vec!["/reset-password".to_owned(), "/forgot-password".to_owned()],
            excluded: ["/api", "/auth", "/_next", "/static", "/pkg", "/healthz"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl RouteTable {
    /// API calls and framework internals pass untouched, as do files outside
    /// the protected areas. A file under a protected prefix is still guarded.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.excluded.iter().any(|prefix| is_under(path, prefix)) {
            return true;
        }
        if self.area_for(path).is_some() {
            return false;
        }
        let path = path.split(['?', '#']).next().unwrap_or(path);
        path.rsplit('/')
            .next()
            .is_some_and(|last| last.contains('.'))
    }

    #[must_use]
    pub fn area_for(&self, path: &str) -> Option<&ProtectedArea> {
        self.areas.iter().find(|area| area.contains(path))
    }

    #[must_use]
    pub fn area_for_scope(&self, scope: SessionScope) -> Option<&ProtectedArea> {
        self.areas.iter().find(|area| area.scope == scope)
    }

    #[must_use]
    pub fn is_auth_only(&self, path: &str) -> bool {
        self.auth_only.iter().any(|page| is_under(path, page))
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        !self.is_excluded(path) && self.area_for(path).is_some()
    }

    /// Landing page after login. Admins go to the dashboard of their app;
    /// everyone else to the client dashboard.
    #[must_use]
    pub fn home_for(&self, role: Role) -> &str {
        let scope = if role == Role::Admin { SessionScope::Admin } else { SessionScope::Client };
        self.area_for_scope(scope)
            .map_or("/", |area| area.home_path.as_str())
    }

    #[must_use]
    pub fn login_for(&self, scope: SessionScope) -> &str {
        self.area_for_scope(scope)
            .map_or("/", |area| area.login_path.as_str())
    }
}

/// Segment-aware prefix test: `/admin/users` is under `/admin`,
/// `/admin-login` is not.
#[must_use]
pub fn is_under(path: &str, prefix: &str) -> bool {
    let path = strip_query(path);
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
