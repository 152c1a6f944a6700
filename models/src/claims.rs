//! JWT claims and segment encoding.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(sig)`.
//! The server signs and verifies them; clients only decode the claims to
//! read the expiry, which is why [`decode_unverified`] lives here.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::profile::Role;

/// Claims carried by every session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id (`users.id` or `admins.id`).
    pub sub: Uuid,
    pub role: Role,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Seconds until expiry; negative once expired.
    #[must_use]
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.exp - now
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token is not three dot-separated segments")]
    Format,
    #[error("token segment is not base64url")]
    Base64,
    #[error("token segment is not valid json: {0}")]
    Json(String),
    #[error("unsupported token algorithm: {0}")]
    Algorithm(String),
    #[error("token signature mismatch")]
    Signature,
    #[error("token expired")]
    Expired,
    #[error("token signing failed")]
    Signing,
}

/// JOSE header. Only HS256 is ever issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
}

impl Header {
    #[must_use]
    pub fn hs256() -> Self {
        Self { alg: "HS256".to_owned(), typ: "JWT".to_owned() }
    }
}

/// A token split into its three raw segments.
#[derive(Debug, Clone, Copy)]
pub struct Segments<'a> {
    pub header: &'a str,
    pub claims: &'a str,
    pub signature: &'a str,
}

impl<'a> Segments<'a> {
    /// The `header.claims` prefix the signature covers.
    #[must_use]
    pub fn signing_input(&self, token: &'a str) -> &'a str {
        &token[..self.header.len() + 1 + self.claims.len()]
    }
}

/// Split a token into segments without decoding them.
///
/// # Errors
///
/// Returns [`TokenError::Empty`] or [`TokenError::Format`].
pub fn split(token: &str) -> Result<Segments<'_>, TokenError> {
    if token.trim().is_empty() {
        return Err(TokenError::Empty);
    }
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None)
            if !header.is_empty() && !claims.is_empty() && !signature.is_empty() =>
        {
            Ok(Segments { header, claims, signature })
        }
        _ => Err(TokenError::Format),
    }
}

/// Encode a value as a base64url JSON segment.
///
/// # Errors
///
/// Returns [`TokenError::Json`] if the value cannot be serialized.
pub fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Json(e.to_string()))?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

/// Decode a base64url JSON segment.
///
/// # Errors
///
/// Returns [`TokenError::Base64`] or [`TokenError::Json`].
pub fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| TokenError::Base64)?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Json(e.to_string()))
}

/// Decode claims without checking the signature.
///
/// Only suitable for reading the expiry client-side; authorization decisions
/// must use the server's verifier.
///
/// # Errors
///
/// Returns any [`TokenError`] describing why the token cannot be decoded.
pub fn decode_unverified(token: &str) -> Result<Claims, TokenError> {
    let segments = split(token)?;
    let header: Header = decode_segment(segments.header)?;
    if header.alg != "HS256" {
        return Err(TokenError::Algorithm(header.alg));
    }
    decode_segment(segments.claims)
}

/// True for values a persisted store may hand back instead of a real token.
#[must_use]
pub fn is_placeholder_token(token: &str) -> bool {
    let trimmed = token.trim();
    trimmed.is_empty() || trimmed == "null" || trimmed == "undefined"
}

#[cfg(test)]
#[path = "claims_test.rs"]
mod tests;
