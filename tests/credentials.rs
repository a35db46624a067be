//! Session renewal and sync-key repair

mod common;

use common::*;
use weread_pacer::app::client::ApiResponse;
use weread_pacer::app::notify::Channel;
use weread_pacer::errors::AuthError;

#[tokio::test]
async fn test_renew_stores_truncated_token() {
    let transport = ScriptedTransport::new();
    transport.push(RENEW_URL, Step::renewed("ABCDEFGH123"));

    let manager = credential_manager(transport.clone(), notifier(RecordingSender::failing(), None));
    let mut session = session_with_token(None);

    let token = manager.renew(&mut session).await.unwrap();

    assert_eq!(token, "ABCDEFGH");
    assert_eq!(session.session_token(), Some("ABCDEFGH"));
    assert_eq!(session.credentials().get("wr_vid"), Some("12345"));

    let calls = transport.calls_to(RENEW_URL);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body["rq"], "%2Fweb%2Fbook%2Fread");
}

#[tokio::test]
async fn test_renew_picks_session_cookie_among_others() {
    let transport = ScriptedTransport::new();
    transport.push(
        RENEW_URL,
        Step::Respond(
            ApiResponse::ok_json(&serde_json::json!({"succ": 1}))
                .with_set_cookie("wr_vid=999; Path=/")
                .with_set_cookie("wr_skey=Zz9Yy8Xx; Path=/; HttpOnly"),
        ),
    );

    let manager = credential_manager(transport, notifier(RecordingSender::failing(), None));
    let mut session = session_with_token(Some("oldkey00"));

    assert_eq!(manager.renew(&mut session).await.unwrap(), "Zz9Yy8Xx");
}

#[tokio::test]
async fn test_renew_without_cookie_notifies_and_fails() {
    let transport = ScriptedTransport::new();
    transport.push(RENEW_URL, Step::renewal_without_cookie());

    let sender = RecordingSender::scripted(&[true]);
    let channel = Channel::PushPlus {
        token: Some("push-token".to_string()),
    };
    let manager = credential_manager(transport, notifier(sender.clone(), Some(channel)));
    let mut session = session_with_token(Some("oldkey00"));

    let result = manager.renew(&mut session).await;

    assert!(matches!(result, Err(AuthError::RenewalFailed)));
    assert_eq!(session.session_token(), Some("oldkey00"));
    assert_eq!(sender.requests().len(), 1);
}

#[tokio::test]
async fn test_renew_transport_failure_is_recoverable() {
    let transport = ScriptedTransport::new();
    transport.push(RENEW_URL, Step::Fail);

    let sender = RecordingSender::failing();
    let channel = Channel::Webhook {
        url: Some("https://status.test/hook".to_string()),
    };
    let manager = credential_manager(transport, notifier(sender.clone(), Some(channel)));
    let mut session = session_with_token(Some("oldkey00"));

    let result = manager.renew(&mut session).await;

    assert!(matches!(result, Err(AuthError::Transport(_))));
    assert_eq!(session.session_token(), Some("oldkey00"));
    assert!(sender.requests().is_empty());
}

#[tokio::test]
async fn test_repair_swallows_transport_errors() {
    let transport = ScriptedTransport::new();
    transport.push(REPAIR_URL, Step::Fail);

    let manager = credential_manager(transport.clone(), notifier(RecordingSender::failing(), None));
    let session = session_with_token(Some("SKEY0001"));

    manager.repair_missing_sync(&session).await;

    let calls = transport.calls_to(REPAIR_URL);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].session_token.as_deref(), Some("SKEY0001"));
}
