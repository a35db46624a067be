//! Notification channels and their wire requests

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::sender::{PushRequest, Route};
use super::Notice;
use crate::constants::notify;
use crate::errors::{ConfigError, NotifyError, NotifyResult};

/// Channel selector as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Token-based push service (PushPlus)
    PushPlus,
    /// Chat-bot message (Telegram)
    Telegram,
    /// Token-in-URL push (WxPusher simple push)
    WxPusher,
    /// Status webhook
    Webhook,
}

impl ChannelKind {
    /// Parse an optional selector; empty or absent disables dispatch
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidChannel` for an unknown name
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, ConfigError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name.parse().map(Some),
        }
    }

    /// Display name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::PushPlus => "PushPlus",
            Self::Telegram => "Telegram",
            Self::WxPusher => "WxPusher",
            Self::Webhook => "Webhook",
        }
    }
}

impl FromStr for ChannelKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pushplus" => Ok(Self::PushPlus),
            "telegram" => Ok(Self::Telegram),
            "wxpusher" => Ok(Self::WxPusher),
            "webhook" | "vercel_api" => Ok(Self::Webhook),
            _ => Err(ConfigError::InvalidChannel {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A selected channel together with its credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// PushPlus: single POST, retried with randomized backoff
    PushPlus { token: Option<String> },
    /// Telegram: POST through the proxy, then once directly
    Telegram {
        bot_token: Option<String>,
        chat_id: Option<String>,
    },
    /// WxPusher: single GET, retried with randomized backoff
    WxPusher { spt: Option<String> },
    /// Status webhook: single POST, never retried
    Webhook { url: Option<String> },
}

impl Channel {
    /// Kind of this channel
    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::PushPlus { .. } => ChannelKind::PushPlus,
            Self::Telegram { .. } => ChannelKind::Telegram,
            Self::WxPusher { .. } => ChannelKind::WxPusher,
            Self::Webhook { .. } => ChannelKind::Webhook,
        }
    }

    /// Build the wire request for a notice
    ///
    /// For Telegram this is the proxied request; the dispatcher derives the
    /// direct fallback from it.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::MissingCredential` when the channel's token or URL
    /// is not configured
    pub fn request(&self, notice: &Notice, timeout: Duration) -> NotifyResult<PushRequest> {
        match self {
            Self::PushPlus { token } => {
                let token = required(token, self.kind(), "token")?;
                Ok(PushRequest::PostJson {
                    url: notify::PUSHPLUS_URL.to_string(),
                    body: json!({
                        "token": token,
                        "title": notify::PUSHPLUS_TITLE,
                        "content": notice.message,
                    }),
                    route: Route::Environment,
                    timeout,
                })
            }
            Self::Telegram { bot_token, chat_id } => {
                let bot_token = required(bot_token, self.kind(), "bot_token")?;
                let chat_id = required(chat_id, self.kind(), "chat_id")?;
                Ok(PushRequest::PostJson {
                    url: format!(
                        "{}/bot{}/sendMessage",
                        notify::TELEGRAM_API_BASE,
                        bot_token
                    ),
                    body: json!({ "chat_id": chat_id, "text": notice.message }),
                    route: Route::Proxied,
                    timeout,
                })
            }
            Self::WxPusher { spt } => {
                let spt = required(spt, self.kind(), "spt")?;
                Ok(PushRequest::Get {
                    url: format!(
                        "{}/{}/{}",
                        notify::WXPUSHER_URL,
                        spt,
                        urlencoding::encode(&notice.message)
                    ),
                    timeout,
                })
            }
            Self::Webhook { url } => {
                let url = required(url, self.kind(), "url")?;
                Ok(PushRequest::PostJson {
                    url: url.to_string(),
                    body: json!({
                        "source": notice.source,
                        "task_name": notice.task_name,
                        "status": notice.status,
                        "message": notice.message,
                        "timestamp": notice.timestamp.timestamp(),
                    }),
                    route: Route::Environment,
                    timeout,
                })
            }
        }
    }
}

fn required<'a>(
    value: &'a Option<String>,
    channel: ChannelKind,
    field: &'static str,
) -> NotifyResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(NotifyError::MissingCredential {
            channel: channel.name(),
            field,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::notify::TaskStatus;

    fn notice() -> Notice {
        Notice::new("done in 20 minutes", TaskStatus::Success, "weread", "tests")
    }

    #[test]
    fn test_channel_kind_parsing() {
        assert_eq!("pushplus".parse::<ChannelKind>().unwrap(), ChannelKind::PushPlus);
        assert_eq!("Telegram".parse::<ChannelKind>().unwrap(), ChannelKind::Telegram);
        assert_eq!("vercel_api".parse::<ChannelKind>().unwrap(), ChannelKind::Webhook);
        assert!(matches!(
            "sms".parse::<ChannelKind>(),
            Err(ConfigError::InvalidChannel { .. })
        ));
    }

    #[test]
    fn test_empty_selector_disables_dispatch() {
        assert_eq!(ChannelKind::parse_optional(None).unwrap(), None);
        assert_eq!(ChannelKind::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(
            ChannelKind::parse_optional(Some("wxpusher")).unwrap(),
            Some(ChannelKind::WxPusher)
        );
    }

    #[test]
    fn test_webhook_body_shape() {
        let channel = Channel::Webhook {
            url: Some("https://status.example/api".to_string()),
        };
        let request = channel.request(&notice(), Duration::from_secs(10)).unwrap();

        let PushRequest::PostJson { url, body, route, .. } = request else {
            panic!("webhook must POST");
        };
        assert_eq!(url, "https://status.example/api");
        assert_eq!(route, Route::Environment);
        assert_eq!(body["source"], "tests");
        assert_eq!(body["task_name"], "weread");
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "done in 20 minutes");
        assert!(body["timestamp"].is_i64());
    }

    #[test]
    fn test_wxpusher_puts_token_and_content_in_url() {
        let channel = Channel::WxPusher {
            spt: Some("SPT_abc".to_string()),
        };
        let request = channel.request(&notice(), Duration::from_secs(10)).unwrap();

        assert_eq!(
            request.url(),
            "https://wxpusher.zjiecode.com/api/send/message/SPT_abc/done%20in%2020%20minutes"
        );
    }

    #[test]
    fn test_only_telegram_fallback_bypasses_proxies() {
        let channels = [
            Channel::PushPlus {
                token: Some("tok".to_string()),
            },
            Channel::WxPusher {
                spt: Some("SPT_abc".to_string()),
            },
            Channel::Webhook {
                url: Some("https://status.example/api".to_string()),
            },
        ];
        for channel in channels {
            let request = channel.request(&notice(), Duration::from_secs(10)).unwrap();
            assert_eq!(request.route(), Route::Environment, "{}", channel.kind());
        }
    }

    #[test]
    fn test_telegram_goes_through_proxy_first() {
        let channel = Channel::Telegram {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("42".to_string()),
        };
        let request = channel.request(&notice(), Duration::from_secs(30)).unwrap();

        assert_eq!(request.url(), "https://api.telegram.org/bot123:abc/sendMessage");
        assert_eq!(request.route(), Route::Proxied);
    }

    #[test]
    fn test_missing_credential() {
        let channel = Channel::PushPlus { token: None };
        let result = channel.request(&notice(), Duration::from_secs(10));
        assert!(matches!(
            result,
            Err(NotifyError::MissingCredential {
                channel: "PushPlus",
                field: "token"
            })
        ));
    }
}
