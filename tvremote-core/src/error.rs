//! Fault taxonomy for remote sessions.
//!
//! Every fallible operation returns [`RemoteResult<T>`]. Faults raised by a
//! protocol engine arrive as [`EngineFault`] and are mapped into the closed
//! [`RemoteError`] set by [`classify`], the only place that knows how the
//! engine reports failures.

use std::time::Duration;
use thiserror::Error;

/// Outcome of every remote operation.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// The canonical error type for remote sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    // ── Precondition Errors ──────────────────────────────────────
    /// The protocol engine has not been started; call `initialize` first.
    #[error("remote is not initialized; call initialize() first")]
    NotInitialized,

    /// A command was issued while no device is connected.
    #[error("not connected to a device; call connect() first")]
    NotConnected,

    // ── Connection Errors ────────────────────────────────────────
    /// The device could not be reached or the data channel was lost.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Pairing Errors ───────────────────────────────────────────
    /// The device demands a pairing code before it accepts commands.
    #[error("pairing with the device is required")]
    PairingRequired,

    /// The device rejected the pairing code.
    #[error("pairing failed: {0}")]
    PairingFailed(String),

    // ── Engine Errors ────────────────────────────────────────────
    /// Any other fault reported by the protocol engine, message preserved.
    #[error("protocol engine fault: {0}")]
    ProtocolFault(String),
}

/// Fieldless view of a [`RemoteError`], for branching on the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    NotInitialized,
    NotConnected,
    ConnectionFailed,
    Timeout,
    PairingRequired,
    PairingFailed,
    ProtocolFault,
}

impl RemoteError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::NotInitialized => FaultKind::NotInitialized,
            Self::NotConnected => FaultKind::NotConnected,
            Self::ConnectionFailed(_) => FaultKind::ConnectionFailed,
            Self::Timeout(_) => FaultKind::Timeout,
            Self::PairingRequired => FaultKind::PairingRequired,
            Self::PairingFailed(_) => FaultKind::PairingFailed,
            Self::ProtocolFault(_) => FaultKind::ProtocolFault,
        }
    }

    /// Whether a caller should offer the user another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectionFailed(_))
    }
}

// ── EngineFault ───────────────────────────────────────────────────

/// A failure surfaced by a protocol engine, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFault {
    /// A command was submitted before the engine was started.
    #[error("engine not started")]
    NotStarted,

    /// The engine's sentinel for "the device wants a pairing code".
    #[error("device requires pairing")]
    PairingRequired,

    /// The engine ran the command and it failed.
    #[error("{0}")]
    Failed(String),

    /// Talking to the engine itself failed (spawn, pipe, decode).
    #[error("engine i/o: {0}")]
    Io(String),
}

impl From<std::io::Error> for EngineFault {
    fn from(e: std::io::Error) -> Self {
        EngineFault::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EngineFault {
    fn from(e: serde_json::Error) -> Self {
        EngineFault::Io(e.to_string())
    }
}

/// Map an engine fault into the remote taxonomy.
pub fn classify(fault: EngineFault) -> RemoteError {
    match fault {
        EngineFault::PairingRequired => RemoteError::PairingRequired,
        EngineFault::NotStarted => RemoteError::NotInitialized,
        EngineFault::Failed(msg) | EngineFault::Io(msg) => RemoteError::ProtocolFault(msg),
    }
}

impl From<EngineFault> for RemoteError {
    fn from(fault: EngineFault) -> Self {
        classify(fault)
    }
}

// ── Result helpers ────────────────────────────────────────────────

/// Callback-style branching on a [`RemoteResult`].
///
/// Each hook runs only for its matching arm and hands the result back
/// unchanged, so hooks chain:
///
/// ```
/// # use tvremote_core::{RemoteError, RemoteResult, RemoteResultExt};
/// let result: RemoteResult<()> = Err(RemoteError::PairingRequired);
/// let mut prompt = false;
/// let _ = result
///     .on_success(|_| unreachable!())
///     .on_pairing_required(|| prompt = true);
/// assert!(prompt);
/// ```
pub trait RemoteResultExt<T>: Sized {
    fn on_success(self, f: impl FnOnce(&T)) -> Self;
    fn on_error(self, f: impl FnOnce(&RemoteError)) -> Self;
    fn on_not_connected(self, f: impl FnOnce()) -> Self;
    fn on_connection_failed(self, f: impl FnOnce(&str)) -> Self;
    fn on_pairing_required(self, f: impl FnOnce()) -> Self;
    fn on_pairing_failed(self, f: impl FnOnce(&str)) -> Self;
}

impl<T> RemoteResultExt<T> for RemoteResult<T> {
    fn on_success(self, f: impl FnOnce(&T)) -> Self {
        if let Ok(value) = &self {
            f(value);
        }
        self
    }

    fn on_error(self, f: impl FnOnce(&RemoteError)) -> Self {
        if let Err(e) = &self {
            f(e);
        }
        self
    }

    fn on_not_connected(self, f: impl FnOnce()) -> Self {
        if let Err(RemoteError::NotConnected) = &self {
            f();
        }
        self
    }

    fn on_connection_failed(self, f: impl FnOnce(&str)) -> Self {
        if let Err(RemoteError::ConnectionFailed(detail)) = &self {
            f(detail);
        }
        self
    }

    fn on_pairing_required(self, f: impl FnOnce()) -> Self {
        if let Err(RemoteError::PairingRequired) = &self {
            f();
        }
        self
    }

    fn on_pairing_failed(self, f: impl FnOnce(&str)) -> Self {
        if let Err(RemoteError::PairingFailed(detail)) = &self {
            f(detail);
        }
        self
    }
}
