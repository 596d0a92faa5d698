//! Owned handle on a protocol engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::{EngineCommand, ProtocolEngine};
use crate::error::EngineFault;

/// Synchronous façade over one [`ProtocolEngine`].
///
/// Start-up is serialised by its own lock so two concurrent
/// [`initialize`](Self::initialize) calls start the engine once.
pub struct EngineAdapter {
    engine: Mutex<Box<dyn ProtocolEngine>>,
    init_lock: Mutex<()>,
    ready: AtomicBool,
}

impl EngineAdapter {
    pub fn new(engine: impl ProtocolEngine + 'static) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    pub fn from_boxed(engine: Box<dyn ProtocolEngine>) -> Self {
        Self {
            engine: Mutex::new(engine),
            init_lock: Mutex::new(()),
            ready: AtomicBool::new(false),
        }
    }

    fn engine(&self) -> MutexGuard<'_, Box<dyn ProtocolEngine>> {
        self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the engine. Idempotent.
    pub fn initialize(&self) -> Result<(), EngineFault> {
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        let mut engine = self.engine();
        if !engine.is_started() {
            engine.start().inspect_err(|e| warn!("engine start failed: {e}"))?;
        }
        self.ready.store(true, Ordering::SeqCst);
        info!("protocol engine started");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Run one command; refuses with [`EngineFault::NotStarted`] until
    /// [`initialize`](Self::initialize) has succeeded.
    pub fn execute(&self, command: EngineCommand) -> Result<Value, EngineFault> {
        if !self.is_ready() {
            return Err(EngineFault::NotStarted);
        }
        debug!("engine <- {command}");
        let result = {
            let mut engine = self.engine();
            let result = engine.execute(&command);
            self.track_liveness(&**engine);
            result
        };
        match &result {
            Ok(value) => debug!("engine -> {} = {value}", command.name()),
            Err(e) => warn!("engine command {} failed: {e}", command.name()),
        }
        result
    }

    /// Best-effort release; never fails.
    pub fn release(&self) {
        if self.is_ready() {
            let mut engine = self.engine();
            engine.release();
            self.track_liveness(&**engine);
        }
    }

    /// An engine that stopped itself (dead process, broken pipe) makes the
    /// adapter unready, so the next `initialize` starts it again.
    fn track_liveness(&self, engine: &dyn ProtocolEngine) {
        if !engine.is_started() && self.ready.swap(false, Ordering::SeqCst) {
            warn!("protocol engine stopped; initialize() will restart it");
        }
    }
}

impl std::fmt::Debug for EngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineAdapter")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
