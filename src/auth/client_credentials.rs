//! OAuth2 client credentials flow against Azure AD.

use crate::auth::token_cache::TokenCache;
use crate::config::Config;
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use zeroize::Zeroizing;

/// An access token rendered as an `Authorization` header value.
#[derive(Clone)]
pub struct BearerToken {
    header_value: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(access_token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            header_value: Zeroizing::new(format!("Bearer {}", access_token)),
            expires_at,
        }
    }

    /// The full header value, `Bearer <token>`.
    pub fn as_header_value(&self) -> &str {
        &self.header_value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("header_value", &"Bearer <redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Confidential client for the client credentials grant.
pub struct ClientCredentialsClient {
    client_id: String,
    client_secret: Zeroizing<String>,
    token_endpoint: String,
    scopes: Vec<String>,
    http_client: reqwest::Client,
    cache: Mutex<TokenCache>,
}

impl ClientCredentialsClient {
    /// Create a new client from configuration.
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http.timeout())
            .connect_timeout(config.http.connect_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client_id: config.oauth.client_id.clone(),
            client_secret: Zeroizing::new(config.oauth.client_secret.clone()),
            token_endpoint: config.token_url(),
            scopes: config.oauth.scopes.clone(),
            http_client,
            cache: Mutex::new(TokenCache::new(config.token.refresh_before_expiry_seconds)?),
        })
    }

    /// Return the cached token if one is still usable.
    pub async fn acquire_token_silent(&self) -> Option<BearerToken> {
        let cache = self.cache.lock().await;
        cache
            .get()
            .map(|cached| BearerToken::new(cached.access_token(), cached.expires_at()))
    }

    /// Request a new token from Azure AD and cache it.
    pub async fn acquire_token_for_client(&self) -> Result<BearerToken, AuthError> {
        let scope = self.scopes.join(" ");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        debug!("Requesting token from {}", self.token_endpoint);

        let response = self
            .http_client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Body may carry AADSTS diagnostics; log it, don't return it
            let error_body = response.text().await.unwrap_or_default();
            error!("Token request failed: HTTP {} - {}", status, error_body);
            return Err(AuthError::TokenRequestFailed(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;

        if token_response.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse(
                "empty access_token".to_string(),
            ));
        }

        let mut cache = self.cache.lock().await;
        let cached = cache.set(token_response.access_token, token_response.expires_in)?;
        let token = BearerToken::new(cached.access_token(), cached.expires_at());

        info!("New access token was acquired from Azure AD");
        Ok(token)
    }

    /// Get a bearer token, from the cache when possible.
    pub async fn get_access_token(&self) -> Result<BearerToken, AuthError> {
        if let Some(token) = self.acquire_token_silent().await {
            info!("Access token was loaded from cache");
            return Ok(token);
        }

        self.acquire_token_for_client().await
    }

    /// Drop any cached token.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.invalidate();
    }
}

/// Token response from Azure AD.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3599
}
