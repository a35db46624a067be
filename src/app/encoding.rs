//! Canonical query encoding and the legacy request checksum
//!
//! The reading endpoint verifies each payload by recomputing [`legacy_hash`]
//! over [`encode`] of the payload fields, so both functions must reproduce the
//! service's output bit for bit.

use serde_json::{Map, Value};

/// Seed shared by both checksum accumulators
const HASH_SEED: u64 = 0x1505_1505;

/// Accumulators are kept to 31 bits after every update
const HASH_MASK: u64 = 0x7fff_ffff;

/// Shift amounts wrap at this modulus
const HASH_ROTATION: usize = 30;

/// Encode a field mapping as `key=value` pairs joined by `&`
///
/// Pairs are ordered by key regardless of the map's own iteration order, and
/// every value is percent-escaped with only ASCII alphanumerics and `-_.~`
/// left as-is (`/` is escaped too).
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use weread_pacer::app::encoding::encode;
///
/// let fields = json!({"b": "a/b", "a": 1});
/// assert_eq!(encode(fields.as_object().unwrap()), "a=1&b=a%2Fb");
/// ```
pub fn encode(fields: &Map<String, Value>) -> String {
    let mut pairs: Vec<(&String, &Value)> = fields.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value_text(value))))
        .collect::<Vec<_>>()
        .join("&")
}

/// Textual form of a payload value before escaping
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Legacy checksum used to sign read payloads
///
/// Walks the characters from the end toward the start two at a time. Each of
/// two 31-bit accumulators (both seeded with `0x15051505`) XORs in a character
/// code shifted left by `(len - i) % 30` and `i % 30` respectively. The result
/// is the lowercase hex of their sum, without prefix or padding.
///
/// This is a compatibility checksum, not a cryptographic hash.
pub fn legacy_hash(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let length = chars.len();

    let mut high = HASH_SEED;
    let mut low = HASH_SEED;

    let mut index = length.saturating_sub(1);
    while index > 0 {
        let tail = u64::from(u32::from(chars[index]));
        let head = u64::from(u32::from(chars[index - 1]));

        high = HASH_MASK & (high ^ (tail << ((length - index) % HASH_ROTATION)));
        low = HASH_MASK & (low ^ (head << (index % HASH_ROTATION)));

        if index < 2 {
            break;
        }
        index -= 2;
    }

    format!("{:x}", high + low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_encode_sorts_keys() {
        let mut map = Map::new();
        map.insert("zeta".to_string(), json!(1));
        map.insert("alpha".to_string(), json!("x"));
        map.insert("mid".to_string(), json!(0));

        assert_eq!(encode(&map), "alpha=x&mid=0&zeta=1");
    }

    #[test]
    fn test_encode_escapes_everything_but_unreserved() {
        let map = fields(json!({"v": "a-b_c.d~e f/g+h"}));
        assert_eq!(encode(&map), "v=a-b_c.d~e%20f%2Fg%2Bh");
    }

    #[test]
    fn test_encode_matches_known_payload() {
        let map = fields(json!({
            "b": "ce032b305a9bc1ce0b0dd2a",
            "ci": 70,
            "sm": "[插图]第三部 a/b",
            "appId": "wb1",
            "co": 0
        }));

        let encoded = encode(&map);
        assert_eq!(
            encoded,
            "appId=wb1&b=ce032b305a9bc1ce0b0dd2a&ci=70&co=0&sm=%5B%E6%8F%92%E5%9B%BE%5D%E7%AC%AC%E4%B8%89%E9%83%A8%20a%2Fb"
        );
        assert_eq!(legacy_hash(&encoded), "55f31842");
    }

    #[test]
    fn test_encode_values_decode_back() {
        let original = "第三部, 50% done & more?";
        let map = fields(json!({ "sm": original }));
        let encoded = encode(&map);
        let value = encoded.strip_prefix("sm=").unwrap();

        assert!(!value.contains(' '));
        assert!(!value.contains('&'));
        assert_eq!(urlencoding::decode(value).unwrap(), original);
    }

    #[test]
    fn test_encode_empty_map() {
        assert_eq!(encode(&Map::new()), "");
    }

    #[test]
    fn test_legacy_hash_short_inputs_return_doubled_seed() {
        assert_eq!(legacy_hash(""), "2a0a2a0a");
        assert_eq!(legacy_hash("a"), "2a0a2a0a");
    }

    #[test]
    fn test_legacy_hash_golden_values() {
        assert_eq!(legacy_hash("ab"), "2a0a2b88");
        assert_eq!(legacy_hash("abc"), "2a0a2a50");
        assert_eq!(legacy_hash("hello world"), "2a0abc8e");
        assert_eq!(
            legacy_hash("appId=wb182564874663h152492176&b=ce032b305a9bc1ce0b0dd2a"),
            "79a12068"
        );
    }

    #[test]
    fn test_legacy_hash_uses_code_points() {
        assert_eq!(legacy_hash("阅读"), "2a083c02");
    }
}
