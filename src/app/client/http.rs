//! reqwest-backed transport
//!
//! Sends the session's captured browser headers and cookies with every request
//! and returns the raw response so callers decide what counts as success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::Client;
use serde_json::Value;

use super::{ApiResponse, Transport};
use crate::app::session::Session;
use crate::errors::{TransportError, TransportResult};

/// HTTP transport over a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wrap a configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build request headers from the session
    ///
    /// Captured headers that are not valid HTTP are skipped with a debug log.
    fn build_headers(session: &Session) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in session.headers() {
            match (
                name.parse::<HeaderName>(),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::debug!("Skipping invalid captured header: {}", name),
            }
        }

        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let credentials = session.credentials();
        if !credentials.is_empty() {
            match HeaderValue::from_str(&credentials.header_value()) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(_) => tracing::warn!("Cookie set contains characters not allowed in a header"),
            }
        }

        headers
    }

    fn map_error(error: reqwest::Error, timeout: Option<Duration>) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                seconds: timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }
        } else if error.is_connect() {
            TransportError::Connection {
                reason: error.to_string(),
            }
        } else {
            TransportError::Http(error)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        session: &Session,
        timeout: Option<Duration>,
    ) -> TransportResult<ApiResponse> {
        let mut request = self
            .client
            .post(url)
            .headers(Self::build_headers(session))
            .body(body.to_string());

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        tracing::debug!("POST {} -> HTTP {}", url, status);

        Ok(ApiResponse {
            status,
            set_cookies,
            body,
        })
    }
}
