//! Integration tests for the browser console relay
//!
//! Each test registers the fake native host from this package in a temporary
//! manifest directory and talks to it as a real child process.
//! Run with: cargo test -p integration-tests

use std::path::Path;

use browser_console::{Console, LineStyle, Submission};
use console_relay::{Error, RelayMessage};
use integration_tests::*;
use serde_json::json;

fn fake_host() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_fake-native-host"))
}

fn expect_response(message: RelayMessage) -> console_relay::HostResponse {
    match message {
        RelayMessage::NativeHostResponse { payload } => payload,
        other => panic!("Expected a host response, got {:?}", other),
    }
}

// ============================================================================
// Channel Tests
// ============================================================================

#[tokio::test]
async fn test_command_round_trip() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start(&registration, None);

    relay.client.execute("whoami").await.expect("Failed to send command");
    let response = expect_response(relay.next_event().await);

    assert_eq!(response.output_text(), Some("ran: whoami"));
    assert_eq!(response.error_text(), None);
    assert!(response.directory_hint().is_some());
    assert_eq!(response.extra.get("return_code"), Some(&json!(0)));
}

#[tokio::test]
async fn test_connection_is_reused() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start(&registration, None);

    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().canonicalize().unwrap();
    relay
        .client
        .execute(format!("cd {}", target.display()))
        .await
        .unwrap();
    expect_response(relay.next_event().await);

    // Same process: the directory change is still in effect
    relay.client.execute("show_dir").await.unwrap();
    let response = expect_response(relay.next_event().await);
    let reported = Path::new(response.output_text().unwrap()).canonicalize().unwrap();
    assert_eq!(reported, target);
}

#[tokio::test]
async fn test_graceful_exit_then_lazy_reconnect() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start(&registration, None);

    relay.client.execute("quit").await.unwrap();
    assert_eq!(
        relay.next_event().await,
        RelayMessage::NativeHostDisconnected {
            error: "graceful".to_string()
        }
    );
    assert!(!relay.channel.is_connected().await);

    relay.client.execute("echo-me").await.unwrap();
    let response = expect_response(relay.next_event().await);
    assert_eq!(response.output_text(), Some("ran: echo-me"));
}

#[tokio::test]
async fn test_crash_is_reported_and_reconnects() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start(&registration, None);

    relay.client.execute("exit 3").await.unwrap();
    match relay.next_event().await {
        RelayMessage::NativeHostDisconnected { error } => {
            assert!(error.contains("exited"), "unexpected reason: {}", error);
            assert_ne!(error, "graceful");
        }
        other => panic!("Expected a disconnect, got {:?}", other),
    }

    relay.client.execute("again").await.unwrap();
    let response = expect_response(relay.next_event().await);
    assert_eq!(response.output_text(), Some("ran: again"));
}

#[tokio::test]
async fn test_protocol_violation_disconnects() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start(&registration, None);

    relay.client.execute("garbage").await.unwrap();
    match relay.next_event().await {
        RelayMessage::NativeHostDisconnected { error } => {
            assert!(error.contains("communicating with the native messaging host"));
        }
        other => panic!("Expected a disconnect, got {:?}", other),
    }
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_missing_registration() {
    init_tracing();
    let registration = HostRegistration::with_manifest("com.example.other", json!({}));
    let mut relay = Relay::start(&registration, None);

    let result = relay.client.execute("dir").await;
    assert!(matches!(result, Err(Error::ConnectFailed { .. })));

    match relay.next_event().await {
        RelayMessage::NativeHostConnectionFailed { error } => {
            assert!(error.contains("not found"), "unexpected reason: {}", error)
        }
        other => panic!("Expected a connection failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mismatched_registration() {
    init_tracing();
    let registration = HostRegistration::with_manifest(
        HOST_NAME,
        json!({
            "name": "com.example.someone_else",
            "path": fake_host(),
            "type": "stdio",
            "allowed_origins": [ORIGIN],
        }),
    );
    let mut relay = Relay::start(&registration, None);

    assert!(relay.client.execute("dir").await.is_err());
    match relay.next_event().await {
        RelayMessage::NativeHostConnectionFailed { error } => {
            assert!(error.contains("does not match"), "unexpected reason: {}", error)
        }
        other => panic!("Expected a connection failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_host_name() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start_for("Com..Example", &registration, None);

    assert!(relay.client.execute("dir").await.is_err());
    match relay.next_event().await {
        RelayMessage::NativeHostConnectionFailed { error } => {
            assert!(error.contains("Invalid native messaging host name"))
        }
        other => panic!("Expected a connection failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_origin_is_checked_and_passed() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());

    let mut allowed = Relay::start(&registration, Some(ORIGIN));
    allowed.client.execute("args").await.unwrap();
    let response = expect_response(allowed.next_event().await);
    assert_eq!(response.output_text(), Some(ORIGIN));

    let mut forbidden = Relay::start(&registration, Some("chrome-extension://intruder/"));
    assert!(forbidden.client.execute("args").await.is_err());
    match forbidden.next_event().await {
        RelayMessage::NativeHostConnectionFailed { error } => {
            assert!(error.contains("forbidden"), "unexpected reason: {}", error)
        }
        other => panic!("Expected a connection failure, got {:?}", other),
    }
}

// ============================================================================
// Console Tests
// ============================================================================

#[tokio::test]
async fn test_console_end_to_end() {
    init_tracing();
    let registration = HostRegistration::new(fake_host());
    let mut relay = Relay::start(&registration, None);
    let mut console = Console::new();

    // Local commands stay local
    assert_eq!(console.submit("echo hi"), Submission::Local);
    assert_eq!(console.submit("help"), Submission::Local);
    assert!(relay.events.try_recv().is_err());

    let Submission::Dispatch(command) = console.submit("hostname") else {
        panic!("Expected a dispatch");
    };
    relay.client.execute(command).await.unwrap();
    console.handle_message(&relay.next_event().await);

    assert!(!console.has_pending());
    let last = console.lines().last().unwrap();
    assert_eq!(last.style, LineStyle::Output);
    assert_eq!(last.text, "ran: hostname");
    assert!(console.prompt().ends_with('>'));
    assert_ne!(console.prompt(), ">");

    let Submission::Dispatch(command) = console.submit("fail boom") else {
        panic!("Expected a dispatch");
    };
    relay.client.execute(command).await.unwrap();
    console.handle_message(&relay.next_event().await);
    assert_eq!(console.lines().last().unwrap().text, "Error: boom");
}

#[tokio::test]
async fn test_console_with_unregistered_host() {
    init_tracing();
    let registration = HostRegistration::with_manifest("com.example.other", json!({}));
    let mut relay = Relay::start(&registration, None);
    let mut console = Console::new();

    let Submission::Dispatch(command) = console.submit("dir") else {
        panic!("Expected a dispatch");
    };
    if let Err(e) = relay.client.execute(command).await {
        console.dispatch_failed(&e);
    }
    console.handle_message(&relay.next_event().await);

    assert!(!console.has_pending());
    let last = console.lines().last().unwrap();
    assert_eq!(last.style, LineStyle::Error);
    assert!(last.text.contains("not found"));

    // Local commands keep working
    assert_eq!(console.submit("echo still here"), Submission::Local);
    assert_eq!(console.lines().last().unwrap().text, "still here");
}
