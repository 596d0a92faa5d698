//! Pairing-code submission with a bounded deadline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::device::Device;
use crate::engine::{EngineCommand, is_truthy};
use crate::error::{RemoteError, RemoteResult, classify};
use crate::remote::session::SessionManager;
use crate::state::{ConnectionState, PairingState};

/// One pairing attempt shared between the waiting caller and the blocking
/// worker.
///
/// The worker only publishes through [`commit`](Self::commit); the caller
/// only gives up through [`abandon`](Self::abandon). Both take the same
/// lock, so exactly one side decides the outcome.
#[derive(Debug, Default)]
struct Attempt {
    token: CancellationToken,
    committed: Mutex<bool>,
}

impl Attempt {
    fn is_abandoned(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `publish` unless the caller already gave up.
    fn commit(&self, publish: impl FnOnce()) -> bool {
        let mut committed = self
            .committed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.token.is_cancelled() {
            return false;
        }
        publish();
        *committed = true;
        true
    }

    /// Give up unless the worker already published.
    fn abandon(&self) -> bool {
        let committed = self
            .committed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *committed {
            return false;
        }
        self.token.cancel();
        true
    }
}

/// Completes pairing for the address recorded by a `PairingRequired`
/// connect.
#[derive(Debug, Clone)]
pub struct PairingCoordinator {
    sessions: SessionManager,
    deadline: Duration,
}

impl PairingCoordinator {
    pub fn new(sessions: SessionManager, deadline: Duration) -> Self {
        Self { sessions, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Submit `code` and re-establish the connection.
    ///
    /// The whole exchange (code, reconnect, device info) must finish within
    /// the deadline. On expiry the attempt is abandoned, `Timeout` is
    /// returned and nothing the worker does afterwards is published.
    pub async fn submit_code(&self, code: &str) -> RemoteResult<Device> {
        let session = self.sessions.session();
        if !self.sessions.adapter().is_ready() {
            return Err(RemoteError::NotInitialized);
        }
        let Some(ip) = session.take_pending_ip() else {
            return Err(RemoteError::PairingFailed(
                "no connection is awaiting pairing".into(),
            ));
        };

        info!("submitting pairing code for {ip}");
        let attempt = Arc::new(Attempt::default());
        let mut worker = tokio::task::spawn_blocking({
            let this = self.clone();
            let code = code.to_string();
            let ip = ip.clone();
            let attempt = attempt.clone();
            move || this.run_attempt(&code, &ip, &attempt)
        });

        match tokio::time::timeout(self.deadline, &mut worker).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join)) => {
                session.set_pending_ip(ip);
                Err(self.sessions.fail(RemoteError::ProtocolFault(format!(
                    "pairing task failed: {join}"
                ))))
            }
            Err(_) if attempt.abandon() => {
                warn!("pairing with {ip} timed out after {:?}", self.deadline);
                session.set_pending_ip(ip);
                Err(self.sessions.fail(RemoteError::Timeout(self.deadline)))
            }
            // The worker published just as the deadline hit; take its result.
            Err(_) => match worker.await {
                Ok(outcome) => outcome,
                Err(join) => Err(RemoteError::ProtocolFault(format!(
                    "pairing task failed: {join}"
                ))),
            },
        }
    }

    fn run_attempt(&self, code: &str, ip: &str, attempt: &Attempt) -> RemoteResult<Device> {
        let adapter = self.sessions.adapter();

        let rejection = match adapter.execute(EngineCommand::FinishPairing {
            code: code.to_string(),
        }) {
            Ok(value) if is_truthy(&value) => None,
            Ok(_) => Some(RemoteError::PairingFailed("pairing code rejected".into())),
            Err(fault) => Some(RemoteError::PairingFailed(classify(fault).to_string())),
        };
        if let Some(err) = rejection {
            let session = self.sessions.session();
            attempt.commit(|| {
                warn!("pairing with {ip} rejected: {err}");
                session.set_pending_ip(ip);
                session.set_pairing(PairingState::PairingFailed(err.clone()));
                self.sessions.fail(err.clone());
            });
            return Err(err);
        }

        if attempt.is_abandoned() {
            return Err(RemoteError::Timeout(self.deadline));
        }

        let reconnect = match adapter.execute(EngineCommand::RetryConnection) {
            Ok(value) if is_truthy(&value) => Ok(()),
            Ok(_) => Err(RemoteError::ConnectionFailed("reconnect failed".into())),
            Err(fault) => Err(classify(fault)),
        };
        if reconnect.is_ok() && attempt.is_abandoned() {
            return Err(RemoteError::Timeout(self.deadline));
        }
        let device = reconnect.and_then(|()| self.sessions.fetch_device(ip));

        match device {
            Ok(device) => {
                let session = self.sessions.session();
                attempt.commit(|| {
                    info!("paired with {device}");
                    session.set_pairing(PairingState::PairingSuccess);
                    session.transition(ConnectionState::Connected(device.clone()));
                });
                Ok(device)
            }
            Err(err) => {
                attempt.commit(|| {
                    self.sessions.fail(err.clone());
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineAdapter, ScriptedEngine};
    use crate::error::EngineFault;
    use crate::state::Session;
    use serde_json::json;

    fn awaiting_pairing(engine: &ScriptedEngine, deadline: Duration) -> PairingCoordinator {
        engine.push("connect_to_tv", Err(EngineFault::PairingRequired));
        let sessions = SessionManager::new(
            Arc::new(EngineAdapter::new(engine.clone())),
            Arc::new(Session::default()),
        );
        sessions.initialize().unwrap();
        assert_eq!(
            sessions.connect("192.168.1.50", "app"),
            Err(RemoteError::PairingRequired)
        );
        PairingCoordinator::new(sessions, deadline)
    }

    #[test]
    fn attempt_commit_and_abandon_are_exclusive() {
        let attempt = Attempt::default();
        assert!(attempt.commit(|| {}));
        assert!(!attempt.abandon());
        assert!(!attempt.is_abandoned());

        let attempt = Attempt::default();
        assert!(attempt.abandon());
        let mut ran = false;
        assert!(!attempt.commit(|| ran = true));
        assert!(!ran);
    }

    #[tokio::test]
    async fn accepted_code_connects() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_secs(3));
        engine.push("get_device_info", Ok(json!({"name": "Den TV"})));

        let device = pairing.submit_code("1234").await.unwrap();
        assert_eq!(device.ip_address(), "192.168.1.50");

        let session = pairing.sessions.session();
        assert_eq!(session.pairing(), PairingState::PairingSuccess);
        assert_eq!(session.connection(), ConnectionState::Connected(device));
        assert!(session.take_pending_ip().is_none());
        assert_eq!(
            engine.call_names(),
            vec!["connect_to_tv", "finish_pairing", "retry_connection", "get_device_info"]
        );
    }

    #[tokio::test]
    async fn rejected_code_keeps_address_for_retry() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_secs(3));
        engine.push("finish_pairing", Ok(json!(false)));

        let err = pairing.submit_code("0000").await.unwrap_err();
        assert!(matches!(err, RemoteError::PairingFailed(_)));
        let session = pairing.sessions.session();
        assert_eq!(session.pairing(), PairingState::PairingFailed(err.clone()));
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));

        // second attempt with the right code
        pairing.submit_code("1234").await.unwrap();
        assert!(session.is_connected());
        assert_eq!(session.pairing(), PairingState::PairingSuccess);
    }

    #[tokio::test]
    async fn failed_reconnect_leaves_pairing_state() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_secs(3));
        engine.push("retry_connection", Ok(json!(false)));

        let err = pairing.submit_code("1234").await.unwrap_err();
        assert_eq!(err, RemoteError::ConnectionFailed("reconnect failed".into()));
        let session = pairing.sessions.session();
        assert_eq!(session.pairing(), PairingState::None);
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));
    }

    #[tokio::test]
    async fn engine_fault_on_code_is_rejection() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_secs(3));
        engine.push("finish_pairing", Err(EngineFault::Failed("bad secret".into())));

        let err = pairing.submit_code("9999").await.unwrap_err();
        match &err {
            RemoteError::PairingFailed(detail) => assert!(detail.contains("bad secret")),
            other => panic!("unexpected {other:?}"),
        }
        let session = pairing.sessions.session();
        assert_eq!(session.pairing(), PairingState::PairingFailed(err.clone()));
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));
        assert_eq!(session.take_pending_ip().as_deref(), Some("192.168.1.50"));
        assert!(!engine.call_names().contains(&"retry_connection"));
    }

    #[tokio::test]
    async fn reconnect_fault_is_classified() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_secs(3));
        engine.push("retry_connection", Err(EngineFault::Failed("tls reset".into())));

        let err = pairing.submit_code("1234").await.unwrap_err();
        assert_eq!(err, RemoteError::ProtocolFault("tls reset".into()));
        let session = pairing.sessions.session();
        assert_eq!(session.pairing(), PairingState::None);
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));
        assert!(!engine.call_names().contains(&"get_device_info"));
    }

    #[tokio::test]
    async fn device_info_fault_after_pairing() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_secs(3));
        engine.push("get_device_info", Err(EngineFault::Failed("no descriptor".into())));

        let err = pairing.submit_code("1234").await.unwrap_err();
        assert_eq!(err, RemoteError::ProtocolFault("no descriptor".into()));
        let session = pairing.sessions.session();
        assert_eq!(session.pairing(), PairingState::None);
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));
        assert!(session.take_pending_ip().is_none());
    }

    #[tokio::test]
    async fn slow_reconnect_stops_before_device_info() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_millis(100));
        engine.delay("retry_connection", Duration::from_millis(300));

        let err = pairing.submit_code("1234").await.unwrap_err();
        assert_eq!(err, RemoteError::Timeout(Duration::from_millis(100)));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            engine.call_names(),
            vec!["connect_to_tv", "finish_pairing", "retry_connection"]
        );
        let session = pairing.sessions.session();
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));
        assert_eq!(session.pairing(), PairingState::None);
    }

    #[tokio::test]
    async fn without_pending_address_engine_is_untouched() {
        let engine = ScriptedEngine::new();
        let sessions = SessionManager::new(
            Arc::new(EngineAdapter::new(engine.clone())),
            Arc::new(Session::default()),
        );
        sessions.initialize().unwrap();
        let pairing = PairingCoordinator::new(sessions, Duration::from_secs(3));

        assert!(matches!(
            pairing.submit_code("1234").await,
            Err(RemoteError::PairingFailed(_))
        ));
        assert!(engine.calls().is_empty());
        assert!(pairing.sessions.session().connection().is_disconnected());
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let engine = ScriptedEngine::new();
        let pairing = awaiting_pairing(&engine, Duration::from_millis(50));
        engine.delay("finish_pairing", Duration::from_millis(400));

        let err = pairing.submit_code("1234").await.unwrap_err();
        assert_eq!(err, RemoteError::Timeout(Duration::from_millis(50)));

        // let the abandoned worker finish; it must not publish
        tokio::time::sleep(Duration::from_millis(600)).await;
        let session = pairing.sessions.session();
        assert_eq!(session.connection(), ConnectionState::ConnectError(err));
        assert_eq!(session.pairing(), PairingState::None);
        assert!(!engine.call_names().contains(&"retry_connection"));
        assert_eq!(session.take_pending_ip().as_deref(), Some("192.168.1.50"));
    }
}
