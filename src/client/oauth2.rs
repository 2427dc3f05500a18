//! OAuth2 client credentials flow for gateway authentication.
//!
//! [`OAuth2Provider`] is a [`CredentialsProvider`] that exchanges a client id
//! and secret for an access token at an identity provider and caches the token
//! until shortly before it expires. Enabled with the `oauth2` feature.

use crate::client::credentials::{CallContext, CredentialsProvider};
use crate::error::{Result, SkeinError};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tracing::{debug, warn};

/// OAuth2 client credentials configuration.
#[derive(Clone)]
pub struct OAuth2Credentials {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Token endpoint URL
    pub token_endpoint: String,
    /// Optional scopes (defaults to none)
    pub scopes: Option<Vec<String>>,
}

impl OAuth2Credentials {
    /// Create new OAuth2 credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_endpoint: token_endpoint.into(),
            scopes: None,
        }
    }

    /// Add scopes to the token request.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Fetch an access token using the client credentials grant.
    pub async fn fetch(&self) -> Result<TokenResponse> {
        let client = reqwest::Client::new();

        let scope = self.scopes.as_ref().map(|s| s.join(" "));
        let request_body = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            scope,
        };

        debug!(
            "Fetching OAuth2 token from {} for client {}",
            self.token_endpoint, self.client_id
        );

        let response = client
            .post(&self.token_endpoint)
            .form(&request_body)
            .send()
            .await
            .map_err(|e| {
                SkeinError::Authentication(format!("failed to send token request: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SkeinError::Authentication(format!("failed to read token response: {}", e))
        })?;

        if status.is_success() {
            let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
                SkeinError::Authentication(format!("failed to parse token response: {}", e))
            })?;
            debug!(
                "Obtained OAuth2 token (expires_in: {:?})",
                token_response.expires_in
            );
            Ok(token_response)
        } else if let Ok(error) = serde_json::from_str::<TokenError>(&body) {
            warn!("OAuth2 token request failed: {}", error);
            Err(SkeinError::Authentication(format!(
                "token request failed: {}",
                error
            )))
        } else {
            warn!(
                "OAuth2 token request failed with status {}: {}",
                status, body
            );
            Err(SkeinError::Authentication(format!(
                "token request failed with status {}",
                status
            )))
        }
    }
}

impl std::fmt::Debug for OAuth2Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// The access token (JWT)
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Token expiry in seconds (optional)
    pub expires_in: Option<u64>,
}

/// OAuth2 error response body.
#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(desc) = &self.error_description {
            write!(f, "{}: {}", self.error, desc)
        } else {
            write!(f, "{}", self.error)
        }
    }
}

/// Token request body for the client credentials grant.
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

/// Access token held until shortly before expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    obtained_at: Instant,
    expires_in: Option<u64>,
}

impl CachedToken {
    /// Expired, with a 30 second buffer so a token never dies mid-flight.
    fn is_expired(&self) -> bool {
        match self.expires_in {
            Some(expires_in) => {
                let buffer = Duration::from_secs(30);
                self.obtained_at.elapsed() + buffer > Duration::from_secs(expires_in)
            }
            // No expiry info, assume valid
            None => false,
        }
    }
}

/// Credential strategy performing the OAuth2 client credentials flow.
///
/// The token is fetched lazily on the first send and re-fetched once the
/// cached one is about to expire; every other send reuses the cache.
#[derive(Debug)]
pub struct OAuth2Provider {
    credentials: OAuth2Credentials,
    cached: RwLock<Option<CachedToken>>,
}

impl OAuth2Provider {
    /// Create a provider around the given credentials.
    pub fn new(credentials: OAuth2Credentials) -> Self {
        Self {
            credentials,
            cached: RwLock::new(None),
        }
    }

    fn cached_token(&self) -> Option<String> {
        self.cached
            .read()
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| token.access_token.clone())
    }
}

#[async_trait]
impl CredentialsProvider for OAuth2Provider {
    async fn headers(&self, _ctx: &CallContext) -> Result<MetadataMap> {
        let access_token = match self.cached_token() {
            Some(token) => token,
            None => {
                let response = self.credentials.fetch().await?;
                *self.cached.write() = Some(CachedToken {
                    access_token: response.access_token.clone(),
                    obtained_at: Instant::now(),
                    expires_in: response.expires_in,
                });
                response.access_token
            }
        };

        let value: AsciiMetadataValue =
            format!("Bearer {}", access_token).parse().map_err(|_| {
                SkeinError::Authentication("access token is not a valid header value".to_string())
            })?;
        let mut headers = MetadataMap::new();
        headers.insert("authorization", value);
        Ok(headers)
    }
}
