//! Delivery of notification requests over HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::errors::{NotifyError, NotifyResult};

/// Network route for a notification request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the configured proxy, else the environment proxy
    Proxied,
    /// Honours `http_proxy` / `https_proxy` from the environment
    Environment,
    /// Direct connection, proxies disabled
    Direct,
}

/// A single notification request on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum PushRequest {
    /// POST with a JSON body
    PostJson {
        url: String,
        body: Value,
        route: Route,
        timeout: Duration,
    },
    /// Plain GET
    Get { url: String, timeout: Duration },
}

impl PushRequest {
    /// Target URL
    pub fn url(&self) -> &str {
        match self {
            Self::PostJson { url, .. } | Self::Get { url, .. } => url,
        }
    }

    /// Route the request takes
    pub fn route(&self) -> Route {
        match self {
            Self::PostJson { route, .. } => *route,
            Self::Get { .. } => Route::Environment,
        }
    }

    /// Same request sent without a proxy
    pub fn direct(&self) -> Self {
        match self {
            Self::PostJson {
                url, body, timeout, ..
            } => Self::PostJson {
                url: url.clone(),
                body: body.clone(),
                route: Route::Direct,
                timeout: *timeout,
            },
            Self::Get { .. } => self.clone(),
        }
    }
}

/// Sends notification requests and returns the response text
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send one request; a non-success status is an error
    async fn send(&self, request: &PushRequest) -> NotifyResult<String>;
}

/// reqwest-backed sender with separate proxied and direct clients
#[derive(Debug, Clone)]
pub struct HttpPushSender {
    proxied: Client,
    environment: Client,
    direct: Client,
}

impl HttpPushSender {
    /// Build the sender
    ///
    /// With `proxy = None` the proxied client falls back to the `http_proxy` /
    /// `https_proxy` environment variables, which reqwest honours by default.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the proxy URL is invalid or a client cannot be
    /// built
    pub fn new(proxy: Option<&str>) -> NotifyResult<Self> {
        let mut proxied = Client::builder();
        if let Some(url) = proxy.filter(|p| !p.is_empty()) {
            proxied = proxied.proxy(reqwest::Proxy::all(url)?);
        }

        Ok(Self {
            proxied: proxied.build()?,
            environment: Client::builder().build()?,
            direct: Client::builder().no_proxy().build()?,
        })
    }

    fn client(&self, route: Route) -> &Client {
        match route {
            Route::Proxied => &self.proxied,
            Route::Environment => &self.environment,
            Route::Direct => &self.direct,
        }
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, request: &PushRequest) -> NotifyResult<String> {
        let builder = match request {
            PushRequest::PostJson {
                url,
                body,
                route,
                timeout,
            } => self.client(*route).post(url).json(body).timeout(*timeout),
            PushRequest::Get { url, timeout } => {
                self.client(Route::Environment).get(url).timeout(*timeout)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::debug!("Notification endpoint body: {}", text);
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        Ok(text)
    }
}
