//! Scoped HTTP fetch session
//!
//! The session wraps the HTTP client handed to collaborators for every
//! fetch. It is owned exclusively by the orchestrator for the run's
//! duration and can be recycled after persistent failures, on the
//! assumption that a stale connection pool is the likely cause.

use crate::config::SessionConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// HTTP fetch session owned by the orchestrator
#[derive(Debug)]
pub struct FetchSession {
    config: SessionConfig,
    client: Client,
}

impl FetchSession {
    /// Builds a session from the configuration
    pub fn new(config: SessionConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    /// The HTTP client collaborators should fetch through
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The configured user agent string
    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    /// Tears this session down and builds a fresh one
    ///
    /// The old client is fully released before its replacement is
    /// created, so two live sessions never coexist.
    pub fn recycle(self) -> Result<Self, reqwest::Error> {
        let Self { config, client } = self;
        drop(client);
        tracing::info!("Recycling fetch session");
        Self::new(config)
    }
}

/// Builds the HTTP client with proper configuration
fn build_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Some(lang) = &config.accept_language {
        match HeaderValue::from_str(lang) {
            Ok(value) => {
                headers.insert(ACCEPT_LANGUAGE, value);
            }
            Err(_) => {
                tracing::warn!("Ignoring invalid accept-language value: {}", lang);
            }
        }
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .default_headers(headers)
        .gzip(true)
        .brotli(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> SessionConfig {
        SessionConfig {
            user_agent: "TidepoolBot/1.0 (+https://example.com/about)".to_string(),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            accept_language: Some("bg-BG,bg;q=0.9".to_string()),
        }
    }

    #[test]
    fn test_build_session() {
        let session = FetchSession::new(create_test_config());
        assert!(session.is_ok());
    }

    #[test]
    fn test_user_agent_accessor() {
        let session = FetchSession::new(create_test_config()).unwrap();
        assert!(session.user_agent().starts_with("TidepoolBot/1.0"));
    }

    #[test]
    fn test_recycle_builds_replacement() {
        let session = FetchSession::new(create_test_config()).unwrap();
        let recycled = session.recycle();
        assert!(recycled.is_ok());
    }

    #[test]
    fn test_invalid_accept_language_tolerated() {
        let mut config = create_test_config();
        config.accept_language = Some("bad\nvalue".to_string());
        assert!(FetchSession::new(config).is_ok());
    }
}
