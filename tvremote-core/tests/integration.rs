//! Integration tests — the full connect / pair / command lifecycle through
//! the `TvRemote` facade, driven by a scripted engine.

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tvremote_core::{
    ConnectionState, EngineCommand, EngineFault, Key, PairingState, RemoteConfig, RemoteError,
    ScriptedEngine, StateStream, TvRemote,
};

// ── Helpers ──────────────────────────────────────────────────────

const TV: &str = "192.168.1.50";

fn remote(engine: &ScriptedEngine) -> TvRemote {
    TvRemote::new(engine.clone(), &RemoteConfig::default())
}

/// An initialized remote whose connect to `TV` ended in `PairingRequired`.
async fn awaiting_pairing(engine: &ScriptedEngine, config: &RemoteConfig) -> TvRemote {
    engine.push("connect_to_tv", Err(EngineFault::PairingRequired));
    let remote = TvRemote::new(engine.clone(), config);
    assert_ok!(remote.initialize().await);
    assert_eq!(
        remote.connect(TV, "app").await,
        Err(RemoteError::PairingRequired)
    );
    remote
}

/// Everything the stream has buffered so far.
async fn drain<T>(stream: &mut StateStream<T>) -> Vec<T>
where
    T: Clone + Send + 'static,
{
    let mut seen = Vec::new();
    while let Ok(Some(value)) = tokio::time::timeout(Duration::from_millis(50), stream.next()).await
    {
        seen.push(value);
    }
    seen
}

// ── Connection lifecycle ─────────────────────────────────────────

#[tokio::test]
async fn test_connect_without_initialize() {
    let engine = ScriptedEngine::new();
    let remote = remote(&engine);
    assert_eq!(
        remote.connect(TV, "app").await,
        Err(RemoteError::NotInitialized)
    );
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_direct_connect() {
    let engine = ScriptedEngine::new();
    engine.push(
        "get_device_info",
        Ok(json!("{'name': 'Living Room', 'model': 'Shield', 'version': '11'}")),
    );
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);
    assert_ok!(remote.initialize().await);
    assert_eq!(engine.start_count(), 1);

    let device = assert_ok!(remote.connect(TV, "app").await);
    assert_eq!(device.ip_address(), TV);
    assert_eq!(device.name(), Some("Living Room"));
    assert_eq!(device.version(), Some("11"));
    assert_eq!(remote.connection_state(), ConnectionState::Connected(device));
    assert_eq!(
        engine.calls()[0],
        EngineCommand::ConnectToTv {
            ip: TV.into(),
            client_name: "app".into()
        }
    );
}

#[tokio::test]
async fn test_connect_failure_is_connect_error() {
    let engine = ScriptedEngine::new();
    engine.push("connect_to_tv", Err(EngineFault::Failed("no route to host".into())));
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);

    let err = assert_err!(remote.connect(TV, "app").await);
    assert!(err.is_retryable());
    assert_eq!(remote.connection_state(), ConnectionState::ConnectError(err));
    assert_eq!(remote.pairing_state(), PairingState::None);
}

#[tokio::test]
async fn test_reinitialize_after_engine_died() {
    let engine = ScriptedEngine::new();
    engine.push("connect_to_tv", Err(EngineFault::Io("expected value at line 1".into())));
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);

    assert_err!(remote.connect(TV, "app").await);
    assert_eq!(
        remote.connect(TV, "app").await,
        Err(RemoteError::NotInitialized)
    );

    assert_ok!(remote.initialize().await);
    assert_eq!(engine.start_count(), 2);
    let device = assert_ok!(remote.connect(TV, "app").await);
    assert_eq!(remote.connection_state(), ConnectionState::Connected(device));
}

// ── Pairing ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_pairing_required_then_paired() {
    let engine = ScriptedEngine::new();
    let remote = awaiting_pairing(&engine, &RemoteConfig::default()).await;
    assert_eq!(remote.connection_state(), ConnectionState::PairingRequired);

    let device = assert_ok!(remote.submit_pairing_code("1234").await);
    assert_eq!(device.ip_address(), TV);
    assert_eq!(remote.pairing_state(), PairingState::PairingSuccess);
    assert!(remote.connection_state().is_connected());
    assert_eq!(
        engine.call_names(),
        vec!["connect_to_tv", "finish_pairing", "retry_connection", "get_device_info"]
    );
}

#[tokio::test]
async fn test_wrong_code_then_right_code() {
    let engine = ScriptedEngine::new();
    engine.push("finish_pairing", Ok(json!(false)));
    let remote = awaiting_pairing(&engine, &RemoteConfig::default()).await;

    let err = assert_err!(remote.submit_pairing_code("0000").await);
    assert!(matches!(err, RemoteError::PairingFailed(_)));
    assert_eq!(remote.pairing_state(), PairingState::PairingFailed(err));

    assert_ok!(remote.submit_pairing_code("1234").await);
    assert_eq!(remote.pairing_state(), PairingState::PairingSuccess);
}

#[tokio::test]
async fn test_pairing_without_pending_connect() {
    let engine = ScriptedEngine::new();
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);

    assert!(matches!(
        remote.submit_pairing_code("1234").await,
        Err(RemoteError::PairingFailed(_))
    ));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_pairing_timeout() {
    let engine = ScriptedEngine::new();
    let config = RemoteConfig {
        pairing_timeout_ms: 100,
        ..RemoteConfig::default()
    };
    let remote = awaiting_pairing(&engine, &config).await;
    engine.delay("finish_pairing", Duration::from_millis(500));

    let started = tokio::time::Instant::now();
    let err = assert_err!(remote.submit_pairing_code("1234").await);
    assert_eq!(err, RemoteError::Timeout(Duration::from_millis(100)));
    assert!(started.elapsed() < Duration::from_millis(450));
    assert_eq!(remote.connection_state(), ConnectionState::ConnectError(err.clone()));

    // The abandoned attempt finishes in the background without publishing.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(remote.connection_state(), ConnectionState::ConnectError(err));
    assert_eq!(remote.pairing_state(), PairingState::None);
}

// ── Commands ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_key_connected() {
    let engine = ScriptedEngine::new();
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);
    assert_ok!(remote.connect(TV, "app").await);

    assert_eq!(
        remote.send_key_code("KEYCODE_VOLUME_UP").await,
        Ok("KEYCODE_VOLUME_UP".to_string())
    );
    assert_eq!(remote.send_key(Key::Home).await, Ok("KEYCODE_HOME".to_string()));
    assert_eq!(remote.send_text("breaking bad").await, Ok("breaking bad".to_string()));
    assert_eq!(
        remote.open_app_by_name("YouTube").await,
        Ok("YouTube".to_string())
    );
    assert_ok!(remote.send_app_link("https://www.youtube.com/watch?v=1").await);
}

#[tokio::test]
async fn test_send_key_disconnected() {
    let engine = ScriptedEngine::new();
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);

    assert_eq!(
        remote.send_key_code("KEYCODE_HOME").await,
        Err(RemoteError::NotConnected)
    );
    assert!(engine.calls().is_empty());
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_command_fault_drops_connection() {
    let engine = ScriptedEngine::new();
    engine.push("send_text", Err(EngineFault::Failed("socket closed".into())));
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);
    assert_ok!(remote.connect(TV, "app").await);

    let err = assert_err!(remote.send_text("hello").await);
    assert_eq!(remote.connection_state(), ConnectionState::ConnectError(err));
    assert_eq!(
        remote.send_key(Key::Back).await,
        Err(RemoteError::NotConnected)
    );
}

// ── Close ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_close_is_idempotent() {
    let engine = ScriptedEngine::new();
    let remote = remote(&engine);
    remote.close().await;

    assert_ok!(remote.initialize().await);
    assert_ok!(remote.connect(TV, "app").await);
    remote.close().await;
    remote.close().await;
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    assert_eq!(remote.pairing_state(), PairingState::None);
    assert_eq!(
        remote.send_key(Key::Home).await,
        Err(RemoteError::NotConnected)
    );
}

#[tokio::test]
async fn test_close_forgets_pending_pairing() {
    let engine = ScriptedEngine::new();
    let remote = awaiting_pairing(&engine, &RemoteConfig::default()).await;
    remote.close().await;
    assert!(matches!(
        remote.submit_pairing_code("1234").await,
        Err(RemoteError::PairingFailed(_))
    ));
    assert!(!engine.call_names().contains(&"finish_pairing"));
}

// ── Observation ──────────────────────────────────────────────────

#[tokio::test]
async fn test_observer_sees_every_transition_in_order() {
    let engine = ScriptedEngine::new();
    engine.push("connect_to_tv", Err(EngineFault::PairingRequired));
    let remote = remote(&engine);
    let mut connection = remote.observe_connection_state();
    let mut pairing = remote.observe_pairing_state();

    assert_ok!(remote.initialize().await);
    assert_err!(remote.connect(TV, "app").await);
    let device = assert_ok!(remote.submit_pairing_code("1234").await);
    remote.close().await;

    assert_eq!(
        drain(&mut connection).await,
        vec![
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::PairingRequired,
            ConnectionState::Connected(device),
            ConnectionState::Disconnected,
        ]
    );
    assert_eq!(
        drain(&mut pairing).await,
        vec![PairingState::None, PairingState::PairingSuccess, PairingState::None]
    );
}

#[tokio::test]
async fn test_late_observer_sees_latest_state() {
    let engine = ScriptedEngine::new();
    let remote = remote(&engine);
    assert_ok!(remote.initialize().await);
    let device = assert_ok!(remote.connect(TV, "app").await);

    let mut late = remote.observe_connection_state();
    assert_eq!(late.next().await, Some(ConnectionState::Connected(device)));
}

#[tokio::test]
async fn test_observed_transitions_are_legal() {
    let engine = ScriptedEngine::new();
    engine
        .push("connect_to_tv", Err(EngineFault::PairingRequired))
        .push("finish_pairing", Ok(json!(false)))
        .push("send_key", Err(EngineFault::Failed("gone".into())));
    let remote = remote(&engine);
    let mut connection = remote.observe_connection_state();

    assert_ok!(remote.initialize().await);
    assert_err!(remote.connect(TV, "app").await);
    assert_err!(remote.submit_pairing_code("0000").await);
    assert_ok!(remote.submit_pairing_code("1234").await);
    assert_err!(remote.send_key(Key::Mute).await);
    assert_ok!(remote.connect(TV, "app").await);
    remote.close().await;

    let seen = drain(&mut connection).await;
    assert_eq!(seen.first(), Some(&ConnectionState::Disconnected));
    assert_eq!(seen.last(), Some(&ConnectionState::Disconnected));
    for pair in seen.windows(2) {
        assert!(
            pair[0].can_transition_to(&pair[1]),
            "illegal edge {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

#[tokio::test]
async fn test_concurrent_callers_are_serialized() {
    let engine = ScriptedEngine::new();
    engine.delay("send_key", Duration::from_millis(20));
    let remote = std::sync::Arc::new(remote(&engine));
    assert_ok!(remote.initialize().await);
    assert_ok!(remote.connect(TV, "app").await);

    let sends: Vec<_> = (0..5)
        .map(|_| {
            let remote = remote.clone();
            tokio::spawn(async move { remote.send_key(Key::VolumeUp).await })
        })
        .collect();
    for send in futures::future::join_all(sends).await {
        assert_eq!(assert_ok!(send), Ok("KEYCODE_VOLUME_UP".to_string()));
    }
    assert_eq!(
        engine.call_names().iter().filter(|n| **n == "send_key").count(),
        5
    );
}
