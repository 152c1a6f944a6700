use std::collections::BTreeMap;

use models::ProfileError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Authenticated call attempted without a usable token. Raised before
    /// any network I/O.
    #[error("no session token held")]
    MissingToken,
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success response that is not a session problem. `fields` carries
    /// per-field validation messages untouched.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String, fields: BTreeMap<String, String> },
    /// The server rejected the session; local state has been cleared.
    #[error("session expired")]
    SessionExpired,
    #[error("request body could not be encoded: {0}")]
    Encode(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid session payload: {0}")]
    InvalidProfile(#[from] ProfileError),
    #[error("session store: {0}")]
    Storage(String),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Field-level validation messages, if this is a validation failure.
    #[must_use]
    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Api { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}
