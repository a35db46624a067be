//! Scripted transports and senders shared by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use weread_pacer::app::client::{ApiResponse, Endpoints, Transport, WeReadClient};
use weread_pacer::app::credentials::CredentialManager;
use weread_pacer::app::engine::{EngineConfig, ReadEngine};
use weread_pacer::app::notify::{
    Channel, DispatchPolicy, Dispatcher, Notifier, PushRequest, PushSender,
};
use weread_pacer::app::payload::{default_template, PayloadBuilder};
use weread_pacer::app::session::{CredentialSet, Session};
use weread_pacer::errors::{NotifyError, NotifyResult, TransportError, TransportResult};

pub const READ_URL: &str = "https://weread.test/read";
pub const RENEW_URL: &str = "https://weread.test/renewal";
pub const REPAIR_URL: &str = "https://weread.test/repair";

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Step {
    Respond(ApiResponse),
    Fail,
}

impl Step {
    pub fn fresh() -> Self {
        Self::Respond(ApiResponse::ok_json(&json!({"succ": 1, "synckey": 7})))
    }

    pub fn unsynced() -> Self {
        Self::Respond(ApiResponse::ok_json(&json!({"succ": 1})))
    }

    pub fn expired() -> Self {
        Self::Respond(ApiResponse::ok_json(&json!({"errCode": -2012})))
    }

    pub fn renewed(token: &str) -> Self {
        Self::Respond(
            ApiResponse::ok_json(&json!({"succ": 1}))
                .with_set_cookie(format!("wr_skey={}; Path=/; Domain=.qq.com", token)),
        )
    }

    pub fn renewal_without_cookie() -> Self {
        Self::Respond(ApiResponse::ok_json(&json!({"succ": 1})))
    }
}

/// A request seen by the scripted transport
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub body: Value,
    pub session_token: Option<String>,
}

/// Transport answering from per-URL queues
///
/// When a queue runs dry the URL's fallback step is used, or a connection
/// failure if none was set.
#[derive(Default)]
pub struct ScriptedTransport {
    queues: Mutex<HashMap<String, VecDeque<Step>>>,
    fallbacks: Mutex<HashMap<String, Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, url: &str, step: Step) {
        self.queues
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(step);
    }

    pub fn fallback(&self, url: &str, step: Step) {
        self.fallbacks
            .lock()
            .unwrap()
            .insert(url.to_string(), step);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        session: &Session,
        _timeout: Option<Duration>,
    ) -> TransportResult<ApiResponse> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            body: body.clone(),
            session_token: session.session_token().map(str::to_string),
        });

        let queued = self
            .queues
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());
        let step = queued.or_else(|| self.fallbacks.lock().unwrap().get(url).cloned());

        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail) | None => Err(TransportError::Connection {
                reason: format!("scripted failure for {}", url),
            }),
        }
    }
}

/// Sender that records every request and answers from a script
#[derive(Default)]
pub struct RecordingSender {
    outcomes: Mutex<VecDeque<bool>>,
    requests: Mutex<Vec<PushRequest>>,
}

impl RecordingSender {
    /// Every send fails
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sends succeed or fail in the given order, then fail
    pub fn scripted(outcomes: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.iter().copied().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<PushRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, request: &PushRequest) -> NotifyResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        let ok = self.outcomes.lock().unwrap().pop_front().unwrap_or(false);
        if ok {
            Ok("ok".to_string())
        } else {
            Err(NotifyError::Status { status: 502 })
        }
    }
}

pub fn endpoints() -> Endpoints {
    Endpoints {
        read: READ_URL.to_string(),
        renew: RENEW_URL.to_string(),
        repair: REPAIR_URL.to_string(),
    }
}

pub fn instant_policy() -> DispatchPolicy {
    DispatchPolicy {
        backoff_min: Duration::ZERO,
        backoff_max: Duration::ZERO,
        ..DispatchPolicy::default()
    }
}

pub fn notifier(sender: Arc<RecordingSender>, channel: Option<Channel>) -> Notifier {
    Notifier::new(
        Dispatcher::new(sender, instant_policy()),
        channel,
        "weread_autoread",
        "weread_script",
    )
}

pub fn session_with_token(token: Option<&str>) -> Session {
    let mut cookies = CredentialSet::new();
    cookies.insert("wr_vid", "12345");
    if let Some(token) = token {
        cookies.insert("wr_skey", token);
    }
    let mut headers = BTreeMap::new();
    headers.insert("user-agent".to_string(), "test-agent".to_string());
    Session::new(headers, cookies)
}

pub fn credential_manager(transport: Arc<ScriptedTransport>, notifier: Notifier) -> CredentialManager {
    let client = WeReadClient::new(transport, endpoints(), Duration::from_secs(1));
    CredentialManager::new(client, notifier, vec!["3300060341".to_string()])
}

pub fn engine(transport: Arc<ScriptedTransport>, notifier: Notifier, read_num: u32) -> ReadEngine {
    let config = EngineConfig {
        read_num,
        max_retries: 3,
        retry_delay: Duration::ZERO,
        think_time: Duration::ZERO,
    };
    let payload = PayloadBuilder::new(default_template(), Vec::new(), Vec::new(), Utc::now());
    ReadEngine::new(credential_manager(transport, notifier), payload, config)
}
