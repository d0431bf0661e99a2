//! End-to-end tests for the mail transport.
//!
//! These tests deliver into a `MemoryClient` so every email the transport
//! builds can be inspected without an SMTP server.

use logmail::{
    Callback, ConfigError, LogCall, LogEvent, LogInfo, MailOptions, MailTransport, MemoryClient, Metadata,
    Outcome, SkipReason, Transport, TransportEvent,
};
use serde_json::json;
use tokio::sync::oneshot;

fn transport(options: MailOptions) -> (MailTransport, MemoryClient) {
    let client = MemoryClient::new();
    let transport = MailTransport::with_client(options, client.clone()).unwrap();
    (transport, client)
}

fn dev() -> MailOptions {
    MailOptions::default()
        .to("dev@server.com")
        .from("dev@server.com")
}

/// Logs through the transport's entrypoint and waits for the callback.
async fn log(transport: &MailTransport, call: impl FnOnce(Callback) -> LogCall) -> Outcome {
    let (tx, rx) = oneshot::channel();
    transport.log(call(Box::new(move |outcome| {
        let _ = tx.send(outcome);
    })));
    rx.await.unwrap()
}

async fn log_info(transport: &MailTransport, info: LogInfo) -> Outcome {
    log(transport, |callback| LogCall::info(info, callback)).await
}

#[derive(Debug, thiserror::Error)]
#[error("connection reset by peer")]
struct ConnectionReset;

#[test]
fn test_missing_recipient_fails_construction() {
    let err = MailTransport::new(MailOptions::default().from("dev@server.com")).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRecipient));

    let err = MailTransport::with_client(MailOptions::default(), MemoryClient::new()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRecipient));
}

#[test]
fn test_smtp_transport_builds_without_network() {
    let transport = MailTransport::new(dev().smtp(logmail::SmtpConfig::new("127.0.0.1"))).unwrap();
    assert_eq!(transport.name(), "mail");
    assert_eq!(transport.level(), "info");
}

#[tokio::test]
async fn test_subject_and_body_from_message() {
    let (transport, client) = transport(dev().subject("{{message}}"));

    let outcome = log_info(&transport, LogInfo::new("info", "hello")).await;

    assert_eq!(outcome, Outcome::Delivered);
    let email = client.last().unwrap();
    assert_eq!(email.subject, "hello");
    assert!(email.text.contains("hello"));
    assert_eq!(email.from.to_string(), "dev@server.com");
    assert_eq!(email.recipients(), "dev@server.com");
}

#[tokio::test]
async fn test_subject_level_placeholder() {
    let (transport, client) = transport(dev().subject("{{level}}"));

    log_info(&transport, LogInfo::new("info", "anything")).await;

    assert_eq!(client.last().unwrap().subject, "info");
}

#[tokio::test]
async fn test_default_subject_uses_first_line() {
    let (transport, client) = transport(dev());

    log_info(&transport, LogInfo::new("error", "disk full\n  at /var/log")).await;

    let email = client.last().unwrap();
    assert_eq!(email.subject, "logmail: error disk full");
    assert_eq!(email.text, "disk full\n  at /var/log");
}

#[tokio::test]
async fn test_formatter_bypasses_default_body() {
    let (transport, client) =
        transport(dev().formatter(|event| format!("!{}!", event.level)));

    log_info(
        &transport,
        LogInfo::new("warn", "hello").with_meta(json!({"ignored": true})),
    )
    .await;

    assert_eq!(client.last().unwrap().text, "!warn!");
}

#[tokio::test]
async fn test_empty_metadata_not_appended() {
    let (transport, client) = transport(dev());

    log_info(&transport, LogInfo::new("info", "hello").with_meta(json!({}))).await;

    assert_eq!(client.last().unwrap().text, "hello");
}

#[tokio::test]
async fn test_metadata_appended_pretty() {
    let (transport, client) = transport(dev());

    let outcome = log(&transport, |callback| {
        LogCall::legacy("info", "login", Some(json!({"user": "ada"}).into()), callback)
    })
    .await;

    assert_eq!(outcome, Outcome::Delivered);
    assert_eq!(client.last().unwrap().text, "login\n\n{\n  \"user\": \"ada\"\n}");
}

#[tokio::test]
async fn test_error_metadata_rendered() {
    let (transport, client) = transport(dev());

    log_info(
        &transport,
        LogInfo::new("error", "upload failed").with_meta(Metadata::error(&ConnectionReset)),
    )
    .await;

    let body = client.last().unwrap().text;
    assert!(body.contains("connection reset by peer"));
    assert!(body.contains("ConnectionReset"));
}

#[tokio::test]
async fn test_silent_sends_nothing() {
    let (transport, client) = transport(dev().silent(true));
    let mut signals = transport.subscribe();

    let outcome = log_info(&transport, LogInfo::new("error", "boom")).await;

    assert_eq!(outcome, Outcome::Skipped(SkipReason::Silent));
    assert!(client.sent().is_empty());
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn test_unique_only_matches_exact_level() {
    let (transport, client) = transport(dev().level("warn").unique(true));

    let outcome = log_info(&transport, LogInfo::new("error", "more severe")).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Level));
    assert!(client.sent().is_empty());

    let outcome = log_info(&transport, LogInfo::new("warn", "exact")).await;
    assert_eq!(outcome, Outcome::Delivered);
    assert_eq!(client.sent().len(), 1);
}

#[tokio::test]
async fn test_filter_suppresses() {
    let (transport, client) =
        transport(dev().filter(|event: &LogEvent| !event.message.starts_with("noisy")));

    let outcome = log_info(&transport, LogInfo::new("info", "noisy heartbeat")).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Filtered));

    log_info(&transport, LogInfo::new("info", "deploy finished")).await;
    assert_eq!(client.sent().len(), 1);
    assert_eq!(client.last().unwrap().text, "deploy finished");
}

#[tokio::test]
async fn test_html_alternative_attached() {
    let (transport, client) = transport(dev().html(true));

    log_info(&transport, LogInfo::new("info", "<p>hi</p>")).await;

    let email = client.last().unwrap();
    assert_eq!(email.html.as_deref(), Some("<p>hi</p>"));
    assert_eq!(email.text, "<p>hi</p>");
}

#[tokio::test]
async fn test_all_recipients_addressed() {
    let (transport, client) = transport(dev().to("ops@server.com"));

    log_info(&transport, LogInfo::new("info", "hello")).await;

    assert_eq!(
        client.last().unwrap().recipients(),
        "dev@server.com, ops@server.com"
    );
}

#[tokio::test]
async fn test_send_failure_is_signalled_not_raised() {
    let (transport, client) = transport(dev());
    let mut signals = transport.subscribe();
    client.fail_with("421 service not available");

    let outcome = log_info(&transport, LogInfo::new("error", "boom")).await;

    assert_eq!(outcome, Outcome::Undelivered);
    match signals.recv().await.unwrap() {
        TransportEvent::Error(err) => assert!(err.to_string().contains("421")),
        other => panic!("expected error signal, got {other:?}"),
    }
    assert!(matches!(
        signals.recv().await.unwrap(),
        TransportEvent::Logged { level } if level == "error"
    ));
}

#[tokio::test]
async fn test_logged_signal_after_delivery() {
    let (transport, _client) = transport(dev());
    let mut signals = transport.subscribe();

    log_info(&transport, LogInfo::new("info", "hello")).await;

    assert!(matches!(
        signals.recv().await.unwrap(),
        TransportEvent::Logged { level } if level == "info"
    ));
}

#[tokio::test]
async fn test_panicking_callback_is_contained() {
    let (transport, client) = transport(dev());
    let mut signals = transport.subscribe();

    transport.log(LogCall::info(LogInfo::new("info", "first"), |_| {
        panic!("consumer bug");
    }));
    assert!(matches!(
        signals.recv().await.unwrap(),
        TransportEvent::Logged { .. }
    ));

    let outcome = log_info(&transport, LogInfo::new("info", "second")).await;
    assert_eq!(outcome, Outcome::Delivered);
    assert_eq!(client.sent().len(), 2);
}

#[tokio::test]
async fn test_dispatch_directly() {
    let (transport, client) = transport(dev().subject("{{level}}: {{message}}"));

    let outcome = transport
        .dispatch(LogEvent::new("warn", "cpu hot", None))
        .await;

    assert!(outcome.is_delivered());
    assert_eq!(client.last().unwrap().subject, "warn: cpu hot");
}

#[tokio::test]
async fn test_options_from_json() -> anyhow::Result<()> {
    let options: MailOptions = serde_json::from_value(json!({
        "to": "dev@server.com",
        "from": "dev@server.com",
        "subject": "{{message}}",
        "host": "smtp.server.com",
        "ssl": true
    }))?;
    let client = MemoryClient::new();
    let transport = MailTransport::with_client(options, client.clone())?;

    log_info(&transport, LogInfo::new("info", "hello")).await;

    assert_eq!(client.last().map(|email| email.subject), Some("hello".to_string()));
    Ok(())
}
