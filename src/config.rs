//! Configuration management for WeRead Pacer
//!
//! Settings are layered: compiled defaults, then a TOML file, then the
//! environment variables used by existing deployments, then CLI flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::app::client::{ClientConfig, Endpoints};
use crate::app::engine::EngineConfig;
use crate::app::notify::{Channel, ChannelKind, DispatchPolicy, Dispatcher, HttpPushSender, Notifier};
use crate::app::payload::{default_template, PayloadBuilder};
use crate::app::session::{CredentialSet, Session};
use crate::constants::{env, http, limits, notify, weread};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Read-tick pacing
    pub engine: EngineConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Captured browser session
    pub session: SessionConfigToml,
    /// Read payload template
    pub payload: PayloadConfigToml,
    /// Notification channel
    pub notify: NotifyConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfigToml {
    /// Ticks per run
    pub read_num: u32,
    /// Recoverable failures tolerated per tick
    pub max_retries: u32,
    /// Wait after each recoverable failure
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Pause after a counted tick
    #[serde(with = "humantime_serde")]
    pub think_time: Duration,
}

impl Default for EngineConfigToml {
    fn default() -> Self {
        Self {
            read_num: limits::DEFAULT_READ_NUM,
            max_retries: limits::MAX_RETRIES,
            retry_delay: limits::RETRY_DELAY,
            think_time: limits::THINK_TIME,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Default request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Timeout for read-accounting requests
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Fallback user agent
    pub user_agent: String,
    /// Endpoint URLs
    pub endpoints: Endpoints,
}

impl Default for ClientConfigToml {
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

/// Captured browser headers and cookies
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfigToml {
    /// Static request headers
    pub headers: BTreeMap<String, String>,
    /// Static cookies
    pub cookies: BTreeMap<String, String>,
    /// Browser "copy as cURL (bash)" command; overrides the tables above
    pub curl_bash: Option<String>,
}

/// Read payload template and book selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfigToml {
    /// Payload fields; the built-in template is used when absent
    pub template: Option<Map<String, Value>>,
    /// Book ids picked at random for `b`
    pub books: Vec<String>,
    /// Chapter ids picked at random for `c`
    pub chapters: Vec<String>,
    /// Book ids sent to the repair endpoint
    pub repair_book_ids: Vec<String>,
}

impl Default for PayloadConfigToml {
    fn default() -> Self {
        Self {
            template: None,
            books: Vec::new(),
            chapters: Vec::new(),
            repair_book_ids: vec![weread::DEFAULT_REPAIR_BOOK_ID.to_string()],
        }
    }
}

/// Notification channel selection and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfigToml {
    /// Channel name; empty disables notifications
    pub method: Option<String>,
    /// Task name reported to the status webhook
    pub task_name: String,
    /// Source reported to the status webhook
    pub source: String,
    /// PushPlus token
    pub pushplus_token: Option<String>,
    /// Telegram bot token
    pub telegram_bot_token: Option<String>,
    /// Telegram chat id
    pub telegram_chat_id: Option<String>,
    /// Proxy for the first Telegram attempt
    pub telegram_proxy: Option<String>,
    /// WxPusher simple-push token
    pub wxpusher_spt: Option<String>,
    /// Status webhook URL
    pub webhook_url: Option<String>,
    /// Attempts for retrying channels
    pub attempts: u32,
    /// Lower backoff bound
    #[serde(with = "humantime_serde")]
    pub backoff_min: Duration,
    /// Upper backoff bound
    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,
    /// Timeout for PushPlus, WxPusher and the webhook
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Timeout for Telegram
    #[serde(with = "humantime_serde")]
    pub telegram_timeout: Duration,
}

impl Default for NotifyConfigToml {
    fn default() -> Self {
        Self {
            method: None,
            task_name: notify::DEFAULT_TASK_NAME.to_string(),
            source: notify::DEFAULT_SOURCE.to_string(),
            pushplus_token: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_proxy: None,
            wxpusher_spt: None,
            webhook_url: None,
            attempts: notify::MAX_ATTEMPTS,
            backoff_min: notify::BACKOFF_MIN,
            backoff_max: notify::BACKOFF_MAX,
            timeout: notify::REQUEST_TIMEOUT,
            telegram_timeout: notify::TELEGRAM_TIMEOUT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI overrides are applied by the caller.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.apply_overrides_from(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from("./weread-pacer.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("weread-pacer").join("config.toml"));
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment-style overrides from `lookup`
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(env::READ_NUM) {
            self.engine.read_num =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: env::READ_NUM.to_string(),
                        value: value.clone(),
                        reason: "Expected a non-negative integer".to_string(),
                    })?;
        }

        if let Some(value) = get(env::PUSH_METHOD) {
            self.notify.method = Some(value);
        }
        if let Some(value) = get(env::PUSHPLUS_TOKEN) {
            self.notify.pushplus_token = Some(value);
        }
        if let Some(value) = get(env::TELEGRAM_BOT_TOKEN) {
            self.notify.telegram_bot_token = Some(value);
        }
        if let Some(value) = get(env::TELEGRAM_CHAT_ID) {
            self.notify.telegram_chat_id = Some(value);
        }
        if let Some(value) = get(env::WXPUSHER_SPT) {
            self.notify.wxpusher_spt = Some(value);
        }
        if let Some(value) = get(env::WEBHOOK_URL) {
            self.notify.webhook_url = Some(value);
        }
        if let Some(value) = get(env::CURL_BASH) {
            self.session.curl_bash = Some(value);
        }
        if self.notify.telegram_proxy.is_none() {
            self.notify.telegram_proxy = get(env::HTTPS_PROXY);
        }

        Ok(())
    }

    /// Check values that would only fail later at runtime
    pub fn validate(&self) -> ConfigResult<()> {
        self.notify.channel_kind()?;

        let endpoints = &self.client.endpoints;
        check_url("client.endpoints.read", &endpoints.read)?;
        check_url("client.endpoints.renew", &endpoints.renew)?;
        check_url("client.endpoints.repair", &endpoints.repair)?;
        if let Some(webhook) = self.notify.webhook_url.as_deref() {
            check_url("notify.webhook_url", webhook)?;
        }

        if self.engine.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.max_retries".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt per tick is required".to_string(),
            });
        }
        Ok(())
    }

    /// Runtime engine configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            read_num: self.engine.read_num,
            max_retries: self.engine.max_retries,
            retry_delay: self.engine.retry_delay,
            think_time: self.engine.think_time,
        }
    }

    /// Runtime client configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.client.request_timeout,
            connect_timeout: self.client.connect_timeout,
            read_timeout: self.client.read_timeout,
            user_agent: self.client.user_agent.clone(),
            endpoints: self.client.endpoints.clone(),
        }
    }

    /// Session built from the static tables and the captured cURL command
    pub fn session(&self) -> ConfigResult<Session> {
        let mut headers = self.session.headers.clone();
        let mut cookies = CredentialSet::new();
        for (name, value) in &self.session.cookies {
            cookies.insert(name.clone(), value.clone());
        }

        if let Some(command) = self.session.curl_bash.as_deref() {
            let captured = parse_curl_bash(command)?;
            headers.extend(captured.headers);
            cookies.extend(captured.cookies);
        }

        Ok(Session::new(headers, cookies))
    }

    /// Payload builder seeded at the current time
    pub fn payload_builder(&self) -> PayloadBuilder {
        PayloadBuilder::new(
            self.payload.template.clone().unwrap_or_else(default_template),
            self.payload.books.clone(),
            self.payload.chapters.clone(),
            Utc::now(),
        )
    }

    /// Notifier for the configured channel
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unknown channel name and
    /// `AppError::Notify` if the HTTP sender cannot be built
    pub fn notifier(&self) -> Result<Notifier> {
        let channel = self.notify.channel()?;
        let sender = HttpPushSender::new(self.notify.telegram_proxy.as_deref())?;
        let dispatcher = Dispatcher::new(Arc::new(sender), self.notify.policy());
        Ok(Notifier::new(
            dispatcher,
            channel,
            self.notify.task_name.clone(),
            self.notify.source.clone(),
        ))
    }
}

impl NotifyConfigToml {
    /// Selected channel kind, `None` when notifications are disabled
    pub fn channel_kind(&self) -> ConfigResult<Option<ChannelKind>> {
        ChannelKind::parse_optional(self.method.as_deref())
    }

    /// Selected channel with its credentials
    pub fn channel(&self) -> ConfigResult<Option<Channel>> {
        Ok(self.channel_kind()?.map(|kind| match kind {
            ChannelKind::PushPlus => Channel::PushPlus {
                token: self.pushplus_token.clone(),
            },
            ChannelKind::Telegram => Channel::Telegram {
                bot_token: self.telegram_bot_token.clone(),
                chat_id: self.telegram_chat_id.clone(),
            },
            ChannelKind::WxPusher => Channel::WxPusher {
                spt: self.wxpusher_spt.clone(),
            },
            ChannelKind::Webhook => Channel::Webhook {
                url: self.webhook_url.clone(),
            },
        }))
    }

    /// Runtime dispatch policy
    pub fn policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            attempts: self.attempts,
            backoff_min: self.backoff_min,
            backoff_max: self.backoff_max,
            request_timeout: self.timeout,
            telegram_timeout: self.telegram_timeout,
        }
    }
}

fn check_url(field: &str, value: &str) -> ConfigResult<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Headers and cookies captured from a cURL command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedRequest {
    /// Request headers, names lowercased, cookie header excluded
    pub headers: BTreeMap<String, String>,
    /// Cookies from `-b` / `--cookie` or a `Cookie:` header
    pub cookies: CredentialSet,
}

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:-H|--header)\s+(?:'([^']*)'|"([^"]*)")"#)
            .expect("Header pattern should be valid")
    })
}

fn cookie_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:-b|--cookie)\s+(?:'([^']*)'|"([^"]*)")"#)
            .expect("Cookie pattern should be valid")
    })
}

/// Extract headers and cookies from a browser "copy as cURL (bash)" command
///
/// # Errors
///
/// Returns `ConfigError::InvalidCurl` if the text is not a curl command or
/// carries neither headers nor cookies
pub fn parse_curl_bash(command: &str) -> ConfigResult<CapturedRequest> {
    if !command.trim_start().starts_with("curl") {
        return Err(ConfigError::InvalidCurl {
            reason: "Command must start with 'curl'".to_string(),
        });
    }

    let mut captured = CapturedRequest::default();

    for caps in header_pattern().captures_iter(command) {
        let Some(raw) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let Some((name, value)) = raw.as_str().split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if name == "cookie" {
            captured.cookies.extend(CredentialSet::from_cookie_string(value));
        } else if !name.is_empty() {
            captured.headers.insert(name, value.to_string());
        }
    }

    for caps in cookie_pattern().captures_iter(command) {
        if let Some(raw) = caps.get(1).or_else(|| caps.get(2)) {
            captured
                .cookies
                .extend(CredentialSet::from_cookie_string(raw.as_str()));
        }
    }

    if captured.headers.is_empty() && captured.cookies.is_empty() {
        return Err(ConfigError::InvalidCurl {
            reason: "No headers or cookies found".to_string(),
        });
    }

    debug!(
        "Captured {} headers and {} cookies from cURL command",
        captured.headers.len(),
        captured.cookies.len()
    );
    Ok(captured)
}
