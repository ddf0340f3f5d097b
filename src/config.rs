//! Credentials file loading for the analytics extract.

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// Path of the aggregates query endpoint, relative to the API base URL.
pub const AGGREGATES_PATH: &str = "/api/v2/analytics/conversations/aggregates/query";

/// Credentials and client settings, read once at startup.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// OAuth2 client ID
    pub client_id: Option<String>,

    /// OAuth2 client secret
    pub client_secret: Option<String>,

    /// Region domain (e.g., "mypurecloud.com", "mypurecloud.ie")
    pub region: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        require("client_id", &self.client_id)?;
        require("client_secret", &self.client_secret)?;
        let region = require("region", &self.region)?;

        if region.contains("://")
            || region.contains('/')
            || region.chars().any(char::is_whitespace)
            || !region.contains('.')
            || region.starts_with('.')
            || region.ends_with('.')
        {
            return Err(ConfigError::Invalid(format!(
                "Invalid region '{}'. Expected a domain such as 'mypurecloud.com'",
                region
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Client ID. Empty only on an unvalidated config.
    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or_default()
    }

    /// Client secret. Empty only on an unvalidated config.
    pub fn client_secret(&self) -> &str {
        self.client_secret.as_deref().unwrap_or_default()
    }

    /// Region domain. Empty only on an unvalidated config.
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }

    /// Get the OAuth2 token URL.
    pub fn token_url(&self) -> String {
        format!("https://login.{}/oauth/token", self.region())
    }

    /// Get the API base URL.
    pub fn api_base_url(&self) -> String {
        format!("https://api.{}", self.region())
    }

    /// Get the aggregates query URL.
    pub fn aggregates_url(&self) -> String {
        format!("{}{}", self.api_base_url(), AGGREGATES_PATH)
    }

    /// Get timeout as Duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

fn require<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    match value.as_deref() {
        None | Some("") => Err(ConfigError::MissingField(name.into())),
        Some(v) => Ok(v),
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("debug", &self.debug)
            .finish()
    }
}
