//! Read payload assembly and signing
//!
//! Every read request carries a freshly stamped and signed copy of the captured
//! payload template. The `sg` field is a SHA-256 over timestamp, nonce and the
//! service salt; the `s` field is [`legacy_hash`] over the [`encode`]d payload.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::app::encoding::{encode, legacy_hash};
use crate::constants::weread;

/// Seconds of reading assumed before the first tick
const INITIAL_READ_SECS: i64 = 30;

/// A signed payload ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPayload {
    /// Signed fields
    pub fields: Value,
    /// Unix time stamped into `ct`
    pub issued_at: i64,
}

/// Builds signed read payloads from a template
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    template: Map<String, Value>,
    books: Vec<String>,
    chapters: Vec<String>,
    last_progress: i64,
}

impl PayloadBuilder {
    /// Create a builder; `started_at` seeds the first `rt` value
    pub fn new(
        template: Map<String, Value>,
        books: Vec<String>,
        chapters: Vec<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            template,
            books,
            chapters,
            last_progress: started_at.timestamp() - INITIAL_READ_SECS,
        }
    }

    /// Build a payload stamped with the current time
    pub fn build_now(&self) -> ReadPayload {
        self.build(Utc::now(), &mut rand::thread_rng())
    }

    /// Build a payload stamped with `now`
    pub fn build<R: Rng>(&self, now: DateTime<Utc>, rng: &mut R) -> ReadPayload {
        let mut fields = self.template.clone();
        fields.remove("s");

        if let Some(book) = self.books.choose(&mut *rng) {
            fields.insert("b".to_string(), json!(book));
        }
        if let Some(chapter) = self.chapters.choose(&mut *rng) {
            fields.insert("c".to_string(), json!(chapter));
        }

        let issued_at = now.timestamp();
        let ts = now.timestamp_millis() + rng.gen_range(0..=1000);
        let rn: u32 = rng.gen_range(0..=1000);

        fields.insert("ct".to_string(), json!(issued_at));
        fields.insert("rt".to_string(), json!(issued_at - self.last_progress));
        fields.insert("ts".to_string(), json!(ts));
        fields.insert("rn".to_string(), json!(rn));
        fields.insert("sg".to_string(), json!(signature(ts, rn)));

        let checksum = legacy_hash(&encode(&fields));
        fields.insert("s".to_string(), json!(checksum));

        ReadPayload {
            fields: Value::Object(fields),
            issued_at,
        }
    }

    /// Record that the payload issued at `issued_at` was counted
    pub fn mark_progress(&mut self, issued_at: i64) {
        self.last_progress = issued_at;
    }
}

/// `sg` field: lowercase hex SHA-256 of `"{ts}{rn}{salt}"`
pub fn signature(ts: i64, rn: u32) -> String {
    let digest = Sha256::digest(format!("{}{}{}", ts, rn, weread::SIGNING_SALT).as_bytes());
    hex::encode(digest)
}

/// Template captured from a browser session
pub fn default_template() -> Map<String, Value> {
    let template = json!({
        "appId": "wb182564874663h152492176",
        "b": "ce032b305a9bc1ce0b0dd2a",
        "c": "7cb321502467cbbc409e62d",
        "ci": 70,
        "co": 0,
        "sm": "[插图]第三部广播纪元7年，程心艰难地回忆着",
        "pr": 74,
        "rt": 30,
        "ts": 1727660516749_i64,
        "rn": 31,
        "sg": "991118cc229871a5442993ecb08b5d2844d7f001dbad9a9bc7b2ecf73dc8db7e",
        "ct": 1727660516,
        "ps": "b1d32a307a4c3259g016b67",
        "pc": "080327b07a4c3259g018787"
    });
    match template {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
