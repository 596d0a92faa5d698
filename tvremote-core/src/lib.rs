//! # tvremote-core
//!
//! Session, pairing and command layer for remote-controlling a networked TV.
//!
//! This crate contains:
//! - **Remote**: `TvRemote`, the async facade, and the components behind it
//! - **State**: `ConnectionState` / `PairingState` machines and their observable streams
//! - **Engine**: the `ProtocolEngine` boundary, a child-process engine and a scripted one
//! - **Keys**: the `Key` vocabulary sent on the wire as `KEYCODE_*`
//! - **Device**: descriptor parsing into `Device`
//! - **Config**: `RemoteConfig`
//! - **Error**: `RemoteError`, a closed `thiserror` taxonomy, and `RemoteResult`
//!
//! ```no_run
//! # use tvremote_core::{ProcessEngine, RemoteConfig, RemoteError, TvRemote};
//! # async fn run() -> Result<(), RemoteError> {
//! let config = RemoteConfig::default();
//! let remote = TvRemote::new(ProcessEngine::new("tv-engine", ["--stdio"]), &config);
//! remote.initialize().await?;
//! match remote.connect("192.168.1.50", &config.client_name).await {
//!     Err(RemoteError::PairingRequired) => {
//!         remote.submit_pairing_code("4F2A").await?;
//!     }
//!     other => {
//!         other?;
//!     }
//! }
//! remote.send_key(tvremote_core::Key::Home).await?;
//! remote.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod keys;
pub mod remote;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use config::RemoteConfig;
pub use device::Device;
pub use engine::{
    EngineAdapter, EngineCommand, ProcessEngine, ProtocolEngine, ScriptedEngine, ScriptedOutcome,
};
pub use error::{EngineFault, FaultKind, RemoteError, RemoteResult, RemoteResultExt, classify};
pub use keys::{Key, UnknownKey};
pub use remote::{CommandDispatcher, PairingCoordinator, SessionManager, TvRemote};
pub use state::{ConnectionState, PairingState, Session, StateCell, StateStream};
