//! Application constants for WeRead Pacer
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names recognised by the configuration loader
pub mod env {
    /// Number of read ticks per run
    pub const READ_NUM: &str = "READ_NUM";

    /// Notification channel selector
    pub const PUSH_METHOD: &str = "PUSH_METHOD";

    /// PushPlus token
    pub const PUSHPLUS_TOKEN: &str = "PUSHPLUS_TOKEN";

    /// Telegram bot token
    pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

    /// Telegram chat id
    pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

    /// WxPusher simple-push token
    pub const WXPUSHER_SPT: &str = "WXPUSHER_SPT";

    /// Status webhook URL
    pub const WEBHOOK_URL: &str = "VERCEL_API_URL";

    /// Browser "copy as cURL (bash)" command carrying headers and cookies
    pub const CURL_BASH: &str = "WXREAD_CURL_BASH";

    /// Proxy used for the Telegram channel when no explicit proxy is configured
    pub const HTTPS_PROXY: &str = "https_proxy";
}

/// WeRead service URLs and protocol values
pub mod weread {
    /// Read-accounting endpoint
    pub const READ_URL: &str = "https://weread.qq.com/web/book/read";

    /// Session-secret renewal endpoint
    pub const RENEW_URL: &str = "https://weread.qq.com/web/login/renewal";

    /// Endpoint used to repair a response that came back without a sync key
    pub const REPAIR_URL: &str = "https://weread.qq.com/web/book/chapterInfos";

    /// Name of the session-secret cookie
    pub const SESSION_COOKIE: &str = "wr_skey";

    /// Length of the session token carried in the session cookie
    pub const SESSION_TOKEN_LEN: usize = 8;

    /// `rq` value sent in the renewal body
    pub const RENEW_REQUEST_PATH: &str = "%2Fweb%2Fbook%2Fread";

    /// Salt mixed into the `sg` payload field
    pub const SIGNING_SALT: &str = "3c5c8717f3daf09iop3423zafeqoi";

    /// Response field marking an accepted request
    pub const SUCCESS_MARKER: &str = "succ";

    /// Response field marking that progress was recorded
    pub const FRESHNESS_MARKER: &str = "synckey";

    /// Default book id sent to the repair endpoint
    pub const DEFAULT_REPAIR_BOOK_ID: &str = "3300060341";
}

/// Read-tick pacing and retry configuration
pub mod limits {
    use super::Duration;

    /// Default number of ticks per run (20 minutes of reading)
    pub const DEFAULT_READ_NUM: u32 = 40;

    /// Maximum recoverable failures tolerated within one tick
    pub const MAX_RETRIES: u32 = 3;

    /// Delay after each recoverable failure
    pub const RETRY_DELAY: Duration = Duration::from_secs(10);

    /// Pause after a counted tick, models real reading pace
    pub const THINK_TIME: Duration = Duration::from_secs(30);

    /// Simulated reading minutes credited per counted tick
    pub const MINUTES_PER_TICK: f64 = 0.5;

    /// Timeout on the read-accounting request
    pub const READ_TIMEOUT: Duration = Duration::from_secs(10);
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent, overridden by captured browser headers
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Notification channel endpoints and policy
pub mod notify {
    use super::Duration;

    /// PushPlus send endpoint
    pub const PUSHPLUS_URL: &str = "https://www.pushplus.plus/send";

    /// Telegram Bot API base, followed by `bot<token>/sendMessage`
    pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

    /// WxPusher simple push endpoint, followed by `<spt>/<content>`
    pub const WXPUSHER_URL: &str = "https://wxpusher.zjiecode.com/api/send/message";

    /// Title attached to PushPlus messages
    pub const PUSHPLUS_TITLE: &str = "WeRead push...";

    /// Attempts made by retrying channels
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Lower bound of the randomized backoff between attempts
    pub const BACKOFF_MIN: Duration = Duration::from_secs(180);

    /// Upper bound of the randomized backoff between attempts
    pub const BACKOFF_MAX: Duration = Duration::from_secs(360);

    /// Timeout for token push services and the status webhook
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for Telegram requests
    pub const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default task name reported to the status webhook
    pub const DEFAULT_TASK_NAME: &str = "weread_autoread";

    /// Default source reported to the status webhook
    pub const DEFAULT_SOURCE: &str = "weread_script";
}
