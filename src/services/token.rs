//! HS256 session token issuance and verification.
//!
//! Claims layout and segment encoding come from `models::claims`; this module
//! adds the secret-dependent half: signing and signature checks.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use models::claims::{self, Header, TokenError};
use models::{Claims, Role};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self { secret: secret.as_bytes().to_vec(), ttl_secs }
    }

    #[cfg(test)]
    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `sub` valid from `now` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the MAC cannot be keyed.
    pub fn issue(&self, sub: Uuid, role: Role, now: i64) -> Result<String, TokenError> {
        let claims = Claims { sub, role, iat: now, exp: now + self.ttl_secs };
        self.sign(&claims)
    }

    /// Re-issue a token for the same identity with a fresh expiry. `iat`
    /// keeps the original sign-in time so credential-change revocation still
    /// applies to rotated tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the MAC cannot be keyed.
    pub fn rotate(&self, claims: &Claims, now: i64) -> Result<String, TokenError> {
        self.sign(&Claims { exp: now + self.ttl_secs, ..claims.clone() })
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = claims::encode_segment(&Header::hs256())?;
        let payload = claims::encode_segment(claims)?;
        let signing_input = format!("{header}.{payload}");
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();
        Ok(format!("{signing_input}.{}", base64_url(&signature)))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] for malformed, tampered, or expired tokens.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let segments = claims::split(token)?;
        let header: Header = claims::decode_segment(segments.header)?;
        if header.alg != "HS256" {
            return Err(TokenError::Algorithm(header.alg));
        }

        let signature = decode_base64_url(segments.signature)?;
        self.mac(segments.signing_input(token).as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let claims: Claims = claims::decode_segment(segments.claims)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, input: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Signing)?;
        mac.update(input);
        Ok(mac)
    }
}

fn base64_url(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

fn decode_base64_url(segment: &str) -> Result<Vec<u8>, TokenError> {
    Base64UrlUnpadded::decode_vec(segment).map_err(|_| TokenError::Base64)
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
