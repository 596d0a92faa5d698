//! Connection lifecycle of a remote session.
//!
//! [`ConnectionState`] models what an observer sees; the allowed edges are
//! encoded in [`ConnectionState::can_transition_to`] and enforced by the
//! session before anything is published.

use crate::device::Device;
use crate::error::RemoteError;

// ── ConnectionState ──────────────────────────────────────────────

/// The current phase of a remote session.
///
/// ```text
///  Disconnected ──► Connecting ──► Connected
///       ▲               │   │          │
///       │               │   ▼          ▼
///       │               │ PairingRequired ──(pairing)──► Connected
///       │               ▼          │
///       └───(close)── ConnectError ◄┘
/// ```
///
/// Every state may return to `Disconnected` via `close()`, and every
/// settled state may start a fresh `Connecting` attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session. Initial / terminal state.
    #[default]
    Disconnected,

    /// A connect attempt is in flight.
    Connecting,

    /// The engine confirmed the link and the descriptor was fetched.
    Connected(Device),

    /// The device wants a pairing code before it accepts commands.
    PairingRequired,

    /// The last operation failed; the fault is kept for observers.
    ConnectError(RemoteError),
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected(_) => write!(f, "Connected"),
            Self::PairingRequired => write!(f, "PairingRequired"),
            Self::ConnectError(e) => write!(f, "ConnectError({e})"),
        }
    }
}

impl ConnectionState {
    /// Returns `true` when commands may be sent.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// The connected device, if any.
    pub fn device(&self) -> Option<&Device> {
        match self {
            Self::Connected(device) => Some(device),
            _ => None,
        }
    }

    /// The recorded fault, if the session is in `ConnectError`.
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Self::ConnectError(e) => Some(e),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Whether moving from `self` to `next` is a legal edge.
    pub fn can_transition_to(&self, next: &ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (_, Disconnected) => true,
            (Connecting, Connected(_) | PairingRequired | ConnectError(_)) => true,
            (Connecting, Connecting) => false,
            (_, Connecting) => true,
            (PairingRequired, Connected(_) | ConnectError(_)) => true,
            (Connected(_), ConnectError(_)) => true,
            // a pairing retry after a timed-out attempt
            (ConnectError(_), Connected(_) | ConnectError(_)) => true,
            _ => false,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
