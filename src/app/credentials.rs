//! Session-key renewal and sync-key repair
//!
//! Renewal never retries on its own. A response without the session cookie is
//! fatal for the whole run; the failure is pushed through the notifier first.

use tracing::{error, info, warn};

use crate::app::client::WeReadClient;
use crate::app::notify::{Notifier, TaskStatus};
use crate::app::session::Session;
use crate::constants::weread;
use crate::errors::{AuthError, AuthResult};

/// Message pushed when the session key cannot be renewed
pub const RENEWAL_FAILURE_MESSAGE: &str =
    "❌ Could not obtain a new session key, or WXREAD_CURL_BASH is misconfigured. Stopping.";

/// Extract the session token from `Set-Cookie` header values
///
/// Scans the `;`-separated fragments of every header value for one mentioning
/// `cookie_name` and returns the first [`weread::SESSION_TOKEN_LEN`] characters
/// after its last `=`. Empty tokens count as absent.
pub fn extract_session_token(set_cookies: &[String], cookie_name: &str) -> Option<String> {
    set_cookies
        .iter()
        .flat_map(|header| header.split(';'))
        .find(|fragment| fragment.contains(cookie_name))
        .and_then(|fragment| fragment.rsplit('=').next())
        .map(|value| {
            value
                .trim()
                .chars()
                .take(weread::SESSION_TOKEN_LEN)
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
}

/// Obtains and renews the session key
#[derive(Debug, Clone)]
pub struct CredentialManager {
    client: WeReadClient,
    notifier: Notifier,
    repair_book_ids: Vec<String>,
}

impl CredentialManager {
    /// Create a manager
    pub fn new(client: WeReadClient, notifier: Notifier, repair_book_ids: Vec<String>) -> Self {
        Self {
            client,
            notifier,
            repair_book_ids,
        }
    }

    /// Client used for renewal and repair
    pub fn client(&self) -> &WeReadClient {
        &self.client
    }

    /// Notifier used for the failure push
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Renew the session key and store it in `session`
    ///
    /// # Errors
    ///
    /// - `AuthError::Transport` if the renewal request fails in transit
    ///   (recoverable, the session is unchanged)
    /// - `AuthError::RenewalFailed` if the response carries no session cookie;
    ///   a failure notification has already been dispatched
    pub async fn renew(&self, session: &mut Session) -> AuthResult<String> {
        info!("🍪 Refreshing session cookie");

        let response = self.client.renew(session).await?;

        match extract_session_token(&response.set_cookies, weread::SESSION_COOKIE) {
            Some(token) => {
                session.set_session_token(token.clone());
                info!("✅ Session key refreshed: {}", token);
                Ok(token)
            }
            None => {
                error!("{}", RENEWAL_FAILURE_MESSAGE);
                self.notifier
                    .notify(RENEWAL_FAILURE_MESSAGE, TaskStatus::Failure)
                    .await;
                Err(AuthError::RenewalFailed)
            }
        }
    }

    /// Ask the service to resync the configured books
    ///
    /// Fire-and-forget: transport errors are logged, never returned.
    pub async fn repair_missing_sync(&self, session: &Session) {
        if let Err(e) = self.client.repair(session, &self.repair_book_ids).await {
            warn!("📡 Sync-key repair request failed: {}", e);
        }
    }
}
