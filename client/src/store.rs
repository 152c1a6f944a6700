//! Token Store: the client's copy of the current session.
//!
//! ARCHITECTURE
//! ============
//! Holds `{ token, profile, is_authenticated }` behind one async mutex, so
//! every mutation (login, logout, refresh, forced logout) is applied by a
//! single writer at a time and persisted before the lock is released.
//!
//! A session `epoch` counts establishments and logouts. Callers that act on
//! a response capture the epoch at dispatch; `logout_if_epoch` and
//! `refresh_if_epoch` only apply while that session is still current, which
//! makes forced logout fire once per session and keeps a late response from
//! resurrecting a session the user already left.
//!
//! No validation happens here; callers validate payloads first.

use std::path::{Path, PathBuf};

use models::Profile;
use models::claims::is_placeholder_token;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::ClientError;

/// Persisted session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub profile: Option<Profile>,
    pub is_authenticated: bool,
}

impl SessionSnapshot {
    fn recompute(&mut self) {
        let has_token = self.token.as_deref().is_some_and(|t| !is_placeholder_token(t));
        self.is_authenticated = has_token && self.profile.is_some();
    }
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: SessionSnapshot,
    epoch: u64,
}

#[derive(Debug)]
pub struct TokenStore {
    inner: Mutex<Inner>,
    path: Option<PathBuf>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TokenStore {
    /// Store without durable persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { inner: Mutex::new(Inner::default()), path: None }
    }

    /// Open a file-backed store. A missing file is the logged-out default;
    /// an unreadable one is logged and treated the same way.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the file exists but cannot be read.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let mut snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<SessionSnapshot>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session file");
                SessionSnapshot::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionSnapshot::default(),
            Err(e) => return Err(ClientError::Storage(format!("{}: {e}", path.display()))),
        };
        // The persisted flag is derived, never trusted.
        snapshot.recompute();
        Ok(Self { inner: Mutex::new(Inner { snapshot, epoch: 0 }), path: Some(path) })
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.snapshot.token.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.inner.lock().await.snapshot.profile.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.snapshot.is_authenticated
    }

    pub async fn epoch(&self) -> u64 {
        self.inner.lock().await.epoch
    }

    pub async fn set_profile(&self, profile: Profile) {
        self.mutate(|inner| inner.snapshot.profile = Some(profile)).await;
    }

    /// Replace the token, leaving the profile untouched.
    pub async fn set_token(&self, token: String) {
        self.mutate(|inner| inner.snapshot.token = Some(token)).await;
    }

    /// Start a new session. Returns its epoch.
    pub async fn establish(&self, profile: Profile, token: String) -> u64 {
        self.mutate(|inner| {
            inner.snapshot.profile = Some(profile);
            inner.snapshot.token = Some(token);
            inner.epoch += 1;
        })
        .await
    }

    /// Clear token, profile and flag in one critical section.
    pub async fn logout(&self) {
        self.mutate(|inner| {
            inner.snapshot = SessionSnapshot::default();
            inner.epoch += 1;
        })
        .await;
    }

    /// Log out only if `epoch` is still the current session.
    pub async fn logout_if_epoch(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return false;
        }
        inner.snapshot = SessionSnapshot::default();
        inner.epoch += 1;
        self.persist(&inner.snapshot).await;
        true
    }

    /// Swap in a rotated token only if `epoch` is still the current session.
    pub async fn refresh_if_epoch(&self, epoch: u64, token: String) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch || inner.snapshot.token.is_none() {
            return false;
        }
        inner.snapshot.token = Some(token);
        inner.snapshot.recompute();
        self.persist(&inner.snapshot).await;
        true
    }

    /// Replace the cached profile wholesale when `fresh` is strictly newer,
    /// and only while `epoch` is still the current session.
    pub async fn adopt_newer_profile(&self, epoch: u64, fresh: Profile) -> bool {
        let mut inner = self.inner.lock().await;
        let newer = inner.snapshot.profile.as_ref().is_some_and(|cached| fresh.is_newer_than(cached));
        if inner.epoch != epoch || !newer {
            return false;
        }
        inner.snapshot.profile = Some(fresh);
        self.persist(&inner.snapshot).await;
        true
    }

    async fn mutate<F>(&self, apply: F) -> u64
    where
        F: FnOnce(&mut Inner),
    {
        let mut inner = self.inner.lock().await;
        apply(&mut inner);
        inner.snapshot.recompute();
        self.persist(&inner.snapshot).await;
        inner.epoch
    }

    /// Write-through; failures are logged and memory stays authoritative.
    async fn persist(&self, snapshot: &SessionSnapshot) {
        let Some(path) = &self.path else {
            return;
        };
        let bytes = match serde_json::to_vec(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "session serialization failed");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(path, bytes).await {
            tracing::warn!(path = %path.display(), error = %e, "session persist failed");
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
