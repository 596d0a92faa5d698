//! Remote session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one [`TvRemote`](crate::TvRemote).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Name the device shows for this remote.
    pub client_name: String,
    /// Bound on a whole pairing attempt, in milliseconds.
    pub pairing_timeout_ms: u64,
    /// Transitions an observer may fall behind before it skips ahead.
    pub event_capacity: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            client_name: "tvremote".into(),
            pairing_timeout_ms: 3000,
            event_capacity: 64,
        }
    }
}

impl RemoteConfig {
    pub fn pairing_timeout(&self) -> Duration {
        Duration::from_millis(self.pairing_timeout_ms)
    }
}
