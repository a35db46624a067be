//! Session context shared by every authenticated request
//!
//! A [`Session`] owns the static request headers and the mutable
//! [`CredentialSet`]. It is created once per run, passed by reference into the
//! client, and only the credential manager mutates it.

use std::collections::BTreeMap;

use crate::constants::weread;
use crate::errors::{AuthError, AuthResult};

/// Cookie name to value mapping sent with every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    cookies: BTreeMap<String, String>,
}

impl CredentialSet {
    /// Create an empty credential set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `name=value; name2=value2` cookie string
    ///
    /// Fragments without `=` or with an empty name are skipped.
    pub fn from_cookie_string(cookie_string: &str) -> Self {
        let mut set = Self::new();
        for part in cookie_string.split(&[';', '\n'][..]).map(str::trim) {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            set.insert(name, value.trim());
        }
        set
    }

    /// Insert or replace a cookie
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Look up a cookie value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Merge another set into this one, overriding existing names
    pub fn extend(&mut self, other: CredentialSet) {
        self.cookies.extend(other.cookies);
    }

    /// Number of cookies held
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Whether no cookies are held
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render as a `Cookie` header value
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Per-run session context: headers plus the credential set
#[derive(Debug, Clone, Default)]
pub struct Session {
    headers: BTreeMap<String, String>,
    credentials: CredentialSet,
}

impl Session {
    /// Create a session from captured headers and cookies
    pub fn new(headers: BTreeMap<String, String>, credentials: CredentialSet) -> Self {
        Self {
            headers,
            credentials,
        }
    }

    /// Static request headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Current credential set
    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// Current session token, if one is present and non-empty
    pub fn session_token(&self) -> Option<&str> {
        self.credentials
            .get(weread::SESSION_COOKIE)
            .filter(|token| !token.is_empty())
    }

    /// Current session token, or `AuthError::MissingSessionToken`
    pub fn require_session_token(&self) -> AuthResult<&str> {
        self.session_token()
            .ok_or_else(|| AuthError::MissingSessionToken {
                cookie: weread::SESSION_COOKIE.to_string(),
            })
    }

    /// Replace the session token after a successful renewal
    pub(crate) fn set_session_token(&mut self, token: impl Into<String>) {
        self.credentials.insert(weread::SESSION_COOKIE, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_string_parsing() {
        let set = CredentialSet::from_cookie_string("wr_vid=123; wr_skey=abcdEFGH;\nwr_name= reader ");
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("wr_skey"), Some("abcdEFGH"));
        assert_eq!(set.get("wr_name"), Some("reader"));
    }

    #[test]
    fn test_require_session_token() {
        let mut session = Session::default();
        assert!(matches!(
            session.require_session_token(),
            Err(AuthError::MissingSessionToken { .. })
        ));

        session.set_session_token("SKEY0001");
        assert_eq!(session.require_session_token().unwrap(), "SKEY0001");
    }

    #[test]
    fn test_cookie_string_skips_malformed_parts() {
        let set = CredentialSet::from_cookie_string("novalue; =orphan; ok=1");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("ok"), Some("1"));
    }

    #[test]
    fn test_header_value_is_stable() {
        let mut set = CredentialSet::new();
        set.insert("wr_vid", "1");
        set.insert("wr_skey", "k");
        assert_eq!(set.header_value(), "wr_skey=k; wr_vid=1");
    }

    #[test]
    fn test_empty_session_token_is_absent() {
        let mut session = Session::default();
        assert!(session.session_token().is_none());

        session.set_session_token("");
        assert!(session.session_token().is_none());

        session.set_session_token("ABCDEFGH");
        assert_eq!(session.session_token(), Some("ABCDEFGH"));
    }
}
