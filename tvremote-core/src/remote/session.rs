//! Connection lifecycle: initialize, connect, disconnect.

use std::sync::Arc;

use tracing::{info, warn};

use crate::device::Device;
use crate::engine::{EngineAdapter, EngineCommand, is_truthy};
use crate::error::{EngineFault, RemoteError, RemoteResult, classify};
use crate::state::{ConnectionState, Session};

/// Drives the connection state of one [`Session`].
///
/// All methods block on the engine; the facade runs them off the async
/// executor.
#[derive(Debug, Clone)]
pub struct SessionManager {
    adapter: Arc<EngineAdapter>,
    session: Arc<Session>,
}

impl SessionManager {
    pub fn new(adapter: Arc<EngineAdapter>, session: Arc<Session>) -> Self {
        Self { adapter, session }
    }

    pub fn adapter(&self) -> &EngineAdapter {
        &self.adapter
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start the engine. Idempotent.
    pub fn initialize(&self) -> RemoteResult<()> {
        self.adapter.initialize().map_err(classify)?;
        Ok(())
    }

    /// Connect to the device at `ip`, identifying as `client_name`.
    ///
    /// Ends in `Connected`, `PairingRequired` or `ConnectError`; the state
    /// is published before this returns.
    pub fn connect(&self, ip: &str, client_name: &str) -> RemoteResult<Device> {
        if !self.adapter.is_ready() {
            return Err(RemoteError::NotInitialized);
        }

        self.session.clear_pending_ip();
        self.session.transition(ConnectionState::Connecting);
        info!("connecting to {ip} as {client_name}");

        let reply = self.adapter.execute(EngineCommand::ConnectToTv {
            ip: ip.to_string(),
            client_name: client_name.to_string(),
        });
        match reply {
            Ok(value) if is_truthy(&value) => {}
            Ok(_) => {
                return Err(self.fail(RemoteError::ConnectionFailed(format!(
                    "device at {ip} refused the connection"
                ))));
            }
            Err(EngineFault::PairingRequired) => {
                info!("{ip} requires pairing");
                self.session.set_pending_ip(ip);
                self.session.transition(ConnectionState::PairingRequired);
                return Err(RemoteError::PairingRequired);
            }
            Err(fault) => {
                let cause = classify(fault);
                return Err(self.fail(RemoteError::ConnectionFailed(format!(
                    "unexpected error: {cause}"
                ))));
            }
        }

        let device = self.fetch_device(ip).map_err(|e| self.fail(e))?;
        info!("connected to {device}");
        self.session
            .transition(ConnectionState::Connected(device.clone()));
        Ok(device)
    }

    /// Drop back to `Disconnected` / `None` and release the engine link.
    ///
    /// Never fails; safe without a prior connect.
    pub fn disconnect(&self) {
        self.session.reset();
        self.adapter.release();
        info!("session closed");
    }

    /// Ask the engine who we are talking to.
    pub(crate) fn fetch_device(&self, ip: &str) -> RemoteResult<Device> {
        let descriptor = self
            .adapter
            .execute(EngineCommand::GetDeviceInfo)
            .map_err(classify)?;
        Ok(Device::from_descriptor(&descriptor, ip))
    }

    /// Record `err` as `ConnectError` and hand it back.
    pub(crate) fn fail(&self, err: RemoteError) -> RemoteError {
        warn!("session fault: {err}");
        self.session
            .transition(ConnectionState::ConnectError(err.clone()));
        err
    }
}
