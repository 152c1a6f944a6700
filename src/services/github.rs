//! GitHub OAuth service: code exchange and profile fetch.
//!
//! The resulting identity is upserted into `users` and handed back to the
//! listing client through the social-login redirect.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::Rng;

use super::accounts::SocialIdentity;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";

/// GitHub OAuth configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GitHubConfig {
    /// Load from `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`, `GITHUB_REDIRECT_URI`.
    /// Returns `None` if any are missing (social login will be disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("GITHUB_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GITHUB_CLIENT_SECRET").ok()?;
        let redirect_uri = std::env::var("GITHUB_REDIRECT_URI").ok()?;
        Some(Self { client_id, client_secret, redirect_uri })
    }

    /// Build the GitHub authorization URL carrying the CSRF `state`.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", "read:user user:email")
            .append_pair("state", state)
            .finish();
        format!("{AUTHORIZE_URL}?{query}")
    }
}

/// Random CSRF value for the OAuth round trip.
#[must_use]
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    Base64UrlUnpadded::encode_string(&bytes)
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl GitHubUser {
    /// Map onto the account fields. GitHub may hide the email; fall back to
    /// the no-reply address so the profile stays valid.
    #[must_use]
    pub fn into_identity(self) -> SocialIdentity {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.login.clone());
        let email = self
            .email
            .filter(|e| e.contains('@'))
            .unwrap_or_else(|| format!("{}@users.noreply.github.com", self.login))
            .to_ascii_lowercase();
        SocialIdentity { github_id: self.id, name, email, avatar_url: self.avatar_url }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("github token exchange failed: {0}")]
    TokenExchange(String),
    #[error("github api error: {0}")]
    Api(String),
}

/// Exchange an OAuth code for an access token.
pub async fn exchange_code(http: &reqwest::Client, config: &GitHubConfig, code: &str) -> Result<String, GitHubError> {
    let resp = http
        .post(TOKEN_URL)
        .header("Accept", "application/json")
        .json(&serde_json::json!({
            "client_id": config.client_id,
            "client_secret": config.client_secret,
            "code": code,
            "redirect_uri": config.redirect_uri,
        }))
        .send()
        .await
        .map_err(|e| GitHubError::TokenExchange(e.to_string()))?;

    let body = resp
        .text()
        .await
        .map_err(|e| GitHubError::TokenExchange(e.to_string()))?;
    let token_resp: TokenResponse =
        serde_json::from_str(&body).map_err(|_| GitHubError::TokenExchange(format!("unexpected response: {body}")))?;
    Ok(token_resp.access_token)
}

/// Fetch the authenticated GitHub user's profile.
pub async fn fetch_user(http: &reqwest::Client, access_token: &str) -> Result<GitHubUser, GitHubError> {
    let resp = http
        .get(USER_URL)
        .header("Authorization", format!("Bearer {access_token}"))
        .header("User-Agent", "realty")
        .send()
        .await
        .map_err(|e| GitHubError::Api(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(GitHubError::Api(format!("{status}: {body}")));
    }

    resp.json::<GitHubUser>()
        .await
        .map_err(|e| GitHubError::Api(e.to_string()))
}
