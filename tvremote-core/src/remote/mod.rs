//! # TvRemote
//!
//! The embedder-facing facade. It owns one session and wires the three
//! components that act on it:
//!
//! | Component            | Owns                                         |
//! |----------------------|----------------------------------------------|
//! | `SessionManager`     | initialize, connect, disconnect              |
//! | `PairingCoordinator` | pairing-code submission under a deadline     |
//! | `CommandDispatcher`  | keys, text, deep links, app launches         |
//!
//! Every operation is `async`. Operations run one at a time in the order
//! they were called, each on the blocking pool, so a slow engine never
//! stalls the caller's executor.

pub mod dispatch;
pub mod pairing;
pub mod session;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::config::RemoteConfig;
use crate::device::Device;
use crate::engine::{EngineAdapter, ProtocolEngine};
use crate::error::{RemoteError, RemoteResult};
use crate::keys::Key;
use crate::state::{ConnectionState, PairingState, Session, StateStream};

pub use dispatch::CommandDispatcher;
pub use pairing::PairingCoordinator;
pub use session::SessionManager;

/// Remote control for one device.
#[derive(Debug)]
pub struct TvRemote {
    session: Arc<Session>,
    sessions: SessionManager,
    pairing: PairingCoordinator,
    commands: CommandDispatcher,
    /// Serialises operations so their state transitions never interleave.
    op_lock: Mutex<()>,
}

impl TvRemote {
    pub fn new(engine: impl ProtocolEngine + 'static, config: &RemoteConfig) -> Self {
        Self::from_boxed(Box::new(engine), config)
    }

    pub fn from_boxed(engine: Box<dyn ProtocolEngine>, config: &RemoteConfig) -> Self {
        let adapter = Arc::new(EngineAdapter::from_boxed(engine));
        let session = Arc::new(Session::new(config.event_capacity));
        let sessions = SessionManager::new(adapter, session.clone());
        Self {
            pairing: PairingCoordinator::new(sessions.clone(), config.pairing_timeout()),
            commands: CommandDispatcher::new(sessions.clone()),
            sessions,
            session,
            op_lock: Mutex::new(()),
        }
    }

    /// Run `op` on the blocking pool, after every earlier operation.
    async fn run<T, F>(&self, op: F) -> RemoteResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> RemoteResult<T> + Send + 'static,
    {
        let _turn = self.op_lock.lock().await;
        tokio::task::spawn_blocking(op).await.unwrap_or_else(|e| {
            warn!("remote operation aborted: {e}");
            Err(RemoteError::ProtocolFault(format!("operation aborted: {e}")))
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the protocol engine. Idempotent.
    pub async fn initialize(&self) -> RemoteResult<()> {
        let sessions = self.sessions.clone();
        self.run(move || sessions.initialize()).await
    }

    /// Connect to the device at `ip`.
    ///
    /// `Err(PairingRequired)` means the device wants a code: show a prompt
    /// and call [`submit_pairing_code`](Self::submit_pairing_code).
    pub async fn connect(&self, ip: &str, client_name: &str) -> RemoteResult<Device> {
        let sessions = self.sessions.clone();
        let (ip, client_name) = (ip.to_string(), client_name.to_string());
        self.run(move || sessions.connect(&ip, &client_name)).await
    }

    /// Finish a pairing requested by the last [`connect`](Self::connect).
    pub async fn submit_pairing_code(&self, code: &str) -> RemoteResult<Device> {
        let _turn = self.op_lock.lock().await;
        self.pairing.submit_code(code).await
    }

    /// Reset to `Disconnected` and release the device link.
    ///
    /// Safe to call at any time, any number of times.
    pub async fn close(&self) {
        let sessions = self.sessions.clone();
        let _ = self
            .run(move || {
                sessions.disconnect();
                Ok(())
            })
            .await;
    }

    // ── Commands ─────────────────────────────────────────────────

    pub async fn send_key(&self, key: Key) -> RemoteResult<String> {
        self.send_key_code(key.as_str()).await
    }

    /// Send a raw key identifier such as `KEYCODE_HOME`.
    pub async fn send_key_code(&self, key_code: &str) -> RemoteResult<String> {
        let commands = self.commands.clone();
        let key_code = key_code.to_string();
        self.run(move || commands.send_key(&key_code)).await
    }

    pub async fn send_text(&self, text: &str) -> RemoteResult<String> {
        let commands = self.commands.clone();
        let text = text.to_string();
        self.run(move || commands.send_text(&text)).await
    }

    /// Open a deep link, e.g. `https://www.netflix.com/title/80057281`.
    pub async fn send_app_link(&self, link: &str) -> RemoteResult<String> {
        let commands = self.commands.clone();
        let link = link.to_string();
        self.run(move || commands.send_app_link(&link)).await
    }

    pub async fn open_app_by_name(&self, name: &str) -> RemoteResult<String> {
        let commands = self.commands.clone();
        let name = name.to_string();
        self.run(move || commands.open_app(&name)).await
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection()
    }

    pub fn pairing_state(&self) -> PairingState {
        self.session.pairing()
    }

    /// Current connection state, then every transition.
    pub fn observe_connection_state(&self) -> StateStream<ConnectionState> {
        self.session.observe_connection()
    }

    /// Current pairing state, then every transition.
    pub fn observe_pairing_state(&self) -> StateStream<PairingState> {
        self.session.observe_pairing()
    }
}
