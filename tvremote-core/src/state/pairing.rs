//! Pairing outcome, tracked independently of the connection phase.

use crate::error::RemoteError;

/// Result of the most recent pairing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PairingState {
    /// No attempt since the session was opened (or closed).
    #[default]
    None,

    /// The device rejected the code, or the reconnect after it failed.
    PairingFailed(RemoteError),

    /// Code accepted and the data channel re-established.
    PairingSuccess,
}

impl PairingState {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::PairingSuccess)
    }
}

impl std::fmt::Display for PairingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::PairingFailed(e) => write!(f, "PairingFailed({e})"),
            Self::PairingSuccess => write!(f, "PairingSuccess"),
        }
    }
}
