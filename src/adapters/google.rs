//! Google OAuth2 service-account token source.
//!
//! Signs an RS256 JWT assertion with the service-account key and
//! exchanges it at the OAuth2 token endpoint. The access token is cached
//! until shortly before expiry; the Sheets and Speech clients share one
//! provider.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::ServiceAccountKey;

/// Scopes the bot needs: Sheets append plus Speech recognition
pub const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets \
     https://www.googleapis.com/auth/drive \
     https://www.googleapis.com/auth/cloud-platform";

const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh this many seconds before the token actually expires
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// JWT claims for the service-account assertion
#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    /// Unix seconds
    expires_at: i64,
}

/// Cached access-token source for Google APIs
pub struct TokenProvider {
    key: ServiceAccountKey,
    scopes: String,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider with the default bot scopes
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_scopes(key, SCOPES)
    }

    /// Create a provider with custom scopes
    pub fn with_scopes(key: ServiceAccountKey, scopes: &str) -> Self {
        Self {
            key,
            scopes: scopes.split_whitespace().collect::<Vec<_>>().join(" "),
            client: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Current access token, fetching a fresh one when the cache is stale
    pub async fn access_token(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token_is_fresh(token.expires_at, now) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token(now).await?;
        let access = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        });

        Ok(access)
    }

    async fn fetch_token(&self, now: i64) -> Result<TokenResponse> {
        let assertion = self.signed_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach Google token endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Google token endpoint error ({}): {}", status, text);
        }

        response
            .json()
            .await
            .context("Failed to parse Google token response")
    }

    /// Build and sign the JWT assertion
    fn signed_assertion(&self, now: i64) -> Result<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scopes,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Invalid service-account private key")?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .context("Failed to sign service-account assertion")
    }
}

/// A cached token is usable while it has more than the leeway left
fn token_is_fresh(expires_at: i64, now: i64) -> bool {
    now < expires_at - EXPIRY_LEEWAY_SECS
}
