//! HTTP client configuration and building logic

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits, weread};
use crate::errors::{TransportError, TransportResult};

/// Endpoint URLs of the reading platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Read-accounting endpoint
    pub read: String,
    /// Session renewal endpoint
    pub renew: String,
    /// Sync-key repair endpoint
    pub repair: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            read: weread::READ_URL.to_string(),
            renew: weread::RENEW_URL.to_string(),
            repair: weread::REPAIR_URL.to_string(),
        }
    }
}

/// Configuration for the reading-platform HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Default request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Timeout for read-accounting requests
    pub read_timeout: Duration,
    /// User agent used when the captured headers carry none
    pub user_agent: String,
    /// Endpoint URLs
    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            read_timeout: limits::READ_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    ///
    /// Cookies are sent explicitly from the session, so the client's own
    /// cookie store stays disabled.
    pub fn build_http_client(&self) -> TransportResult<Client> {
        Client::builder()
            .cookie_store(false)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(TransportError::Http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.endpoints.renew, weread::RENEW_URL);
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig {
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(config.build_http_client().is_ok());
    }
}
