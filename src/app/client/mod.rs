//! HTTP client for the WeRead web API
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: reqwest-backed [`Transport`] implementation
//!
//! [`WeReadClient`] knows the three endpoints the run talks to and how to
//! classify a read response. The actual wire access goes through the
//! [`Transport`] trait so the state machine can be driven without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::session::Session;
use crate::constants::weread;
use crate::errors::{TransportError, TransportResult};

pub mod config;
pub mod http;

pub use config::{ClientConfig, Endpoints};
pub use http::HttpTransport;

/// Raw response as seen by the client
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Every `Set-Cookie` header value, in arrival order
    pub set_cookies: Vec<String>,
    /// Response body text
    pub body: String,
}

impl ApiResponse {
    /// Build a 200 response with a JSON body
    pub fn ok_json(body: &Value) -> Self {
        Self {
            status: 200,
            set_cookies: Vec::new(),
            body: body.to_string(),
        }
    }

    /// Attach a `Set-Cookie` header value
    pub fn with_set_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookies.push(cookie.into());
        self
    }

    /// Parse the body as JSON
    pub fn json(&self) -> TransportResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::InvalidBody {
            reason: e.to_string(),
        })
    }
}

/// Wire access used by [`WeReadClient`]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a compact JSON body with the session's headers and cookies
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        session: &Session,
        timeout: Option<Duration>,
    ) -> TransportResult<ApiResponse>;
}

/// Classification of a read-accounting response
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Accepted and progress recorded
    Fresh(Value),
    /// Accepted but no sync key returned; progress not recorded
    Unsynced(Value),
    /// Not accepted; the session key has expired
    Expired(Value),
}

impl ReadOutcome {
    /// Classify a decoded response body by its markers
    pub fn classify(body: Value) -> Self {
        let has = |field: &str| body.get(field).is_some();
        match (has(weread::SUCCESS_MARKER), has(weread::FRESHNESS_MARKER)) {
            (true, true) => Self::Fresh(body),
            (true, false) => Self::Unsynced(body),
            (false, _) => Self::Expired(body),
        }
    }
}

/// Client for the reading, renewal and repair endpoints
#[derive(Clone)]
pub struct WeReadClient {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    read_timeout: Duration,
}

impl std::fmt::Debug for WeReadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeReadClient")
            .field("endpoints", &self.endpoints)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl WeReadClient {
    /// Create a client over an arbitrary transport
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints, read_timeout: Duration) -> Self {
        Self {
            transport,
            endpoints,
            read_timeout,
        }
    }

    /// Create a client backed by reqwest
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be built
    pub fn from_config(config: &ClientConfig) -> TransportResult<Self> {
        let transport = HttpTransport::new(config.build_http_client()?);
        Ok(Self::new(
            Arc::new(transport),
            config.endpoints.clone(),
            config.read_timeout,
        ))
    }

    /// Endpoints in use
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send one read-accounting request and classify the answer
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on network failure, timeout, or a body that is
    /// not JSON
    pub async fn read(&self, session: &Session, payload: &Value) -> TransportResult<ReadOutcome> {
        let response = self
            .transport
            .post_json(&self.endpoints.read, payload, session, Some(self.read_timeout))
            .await?;
        let body = response.json()?;
        tracing::info!("📕 response: {}", body);
        Ok(ReadOutcome::classify(body))
    }

    /// Ask the renewal endpoint for a fresh session cookie
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails in transit
    pub async fn renew(&self, session: &Session) -> TransportResult<ApiResponse> {
        let body = json!({ "rq": weread::RENEW_REQUEST_PATH });
        self.transport
            .post_json(&self.endpoints.renew, &body, session, None)
            .await
    }

    /// Tell the service to resync the given books; the response is ignored
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails in transit
    pub async fn repair(&self, session: &Session, book_ids: &[String]) -> TransportResult<()> {
        let body = json!({ "bookIds": book_ids });
        self.transport
            .post_json(&self.endpoints.repair, &body, session, None)
            .await?;
        Ok(())
    }
}
