//! OAuth2 client credentials authentication.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::AuthError;

/// OAuth2 client that exchanges the configured credentials for a bearer token.
///
/// Every call to [`OAuth2Client::get_access_token`] performs a fresh token request; nothing is
/// cached between calls.
#[derive(Clone)]
pub struct OAuth2Client {
    config: Config,
    token_url: String,
    http_client: Client,
}

impl OAuth2Client {
    /// Create a new OAuth2 client posting to `token_url`.
    pub fn new(config: Config, token_url: impl Into<String>) -> Result<Self, AuthError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AuthError::HttpClientInit(e.to_string()))?;

        Ok(Self {
            config,
            token_url: token_url.into(),
            http_client,
        })
    }

    /// Fetch an access token from the OAuth2 token endpoint.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        // Basic Auth header (Base64 encoded client_id:client_secret)
        let credentials = format!("{}:{}", self.config.client_id(), self.config.client_secret());
        let encoded = BASE64.encode(credentials.as_bytes());
        let auth_header = format!("Basic {}", encoded);

        tracing::debug!(url = %self.token_url, "Fetching access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .header("Authorization", &auth_header)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, body = %body, "Token request failed");
            return Err(AuthError::TokenRequestFailed { status, body });
        }

        let body = response.text().await?;
        let token_response: Value = serde_json::from_str(&body).map_err(|e| {
            AuthError::MalformedResponse(format!("Failed to parse token response: {}", e))
        })?;

        let access_token = token_response
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::MalformedResponse("missing access_token".to_string()))?;

        if let Some(expires_in) = token_response.get("expires_in").and_then(Value::as_i64) {
            tracing::debug!(expires_in, "Access token acquired");
        }

        Ok(access_token.to_string())
    }
}

impl std::fmt::Debug for OAuth2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Client")
            .field("token_url", &self.token_url)
            .field("region", &self.config.region)
            .finish()
    }
}
