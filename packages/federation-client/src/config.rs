use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::{FederationError, Result};

pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CATALOG_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    /// Freshness window of the option catalog cache
    pub catalog_ttl: Duration,
    /// Minimum gap between two catalog requests
    pub catalog_delay: Duration,
    pub max_attachment_bytes: usize,
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            catalog_ttl: DEFAULT_CATALOG_TTL,
            catalog_delay: DEFAULT_CATALOG_DELAY,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let api_url = env::var("FEDERATION_API_URL")
            .map_err(|_| FederationError::Config("FEDERATION_API_URL must be set".into()))?;

        let mut config = Self::new(api_url);
        config.api_token = env::var("FEDERATION_API_TOKEN").ok().filter(|t| !t.is_empty());

        if let Some(secs) = parse_var::<u64>("FEDERATION_CATALOG_TTL_SECS")? {
            config.catalog_ttl = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64>("FEDERATION_CATALOG_DELAY_MS")? {
            config.catalog_delay = Duration::from_millis(ms);
        }
        if let Some(bytes) = parse_var::<usize>("FEDERATION_MAX_ATTACHMENT_BYTES")? {
            config.max_attachment_bytes = bytes;
        }
        if let Some(secs) = parse_var::<u64>("FEDERATION_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_ttl = ttl;
        self
    }

    pub fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.catalog_delay = delay;
        self
    }

    pub fn with_max_attachment_bytes(mut self, bytes: usize) -> Self {
        self.max_attachment_bytes = bytes;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FederationError::Config(format!("{name} must be a valid number"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://api.fedetenis.ec/");
        assert_eq!(config.api_url, "https://api.fedetenis.ec");
        assert_eq!(config.catalog_ttl, Duration::from_secs(300));
        assert_eq!(config.max_attachment_bytes, 5 * 1024 * 1024);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("http://localhost:8000")
            .with_token("abc")
            .with_catalog_delay(Duration::ZERO);
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.catalog_delay, Duration::ZERO);
    }
}
