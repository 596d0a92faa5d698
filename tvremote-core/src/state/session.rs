//! The mutable session aggregate shared by the remote's components.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::state::cell::{StateCell, StateStream};
use crate::state::connection::ConnectionState;
use crate::state::pairing::PairingState;

/// Connection state, pairing state and the address awaiting pairing.
///
/// One per remote; only the session manager and pairing coordinator
/// write to it.
#[derive(Debug)]
pub struct Session {
    connection: StateCell<ConnectionState>,
    pairing: StateCell<PairingState>,
    /// Address of the connect attempt that ended in `PairingRequired`.
    pending_ip: Mutex<Option<String>>,
}

impl Session {
    pub fn new(event_capacity: usize) -> Self {
        Self {
            connection: StateCell::new(ConnectionState::Disconnected, event_capacity),
            pairing: StateCell::new(PairingState::None, event_capacity),
            pending_ip: Mutex::new(None),
        }
    }

    // ── Connection ────────────────────────────────────────────────

    pub fn connection(&self) -> ConnectionState {
        self.connection.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.get().is_connected()
    }

    /// Move to `next` if the edge is legal; illegal edges are logged and
    /// dropped.
    pub fn transition(&self, next: ConnectionState) -> bool {
        let label = next.to_string();
        let mut refused_from = None;
        let applied = self.connection.set_if(next, |current, next| {
            let ok = current.can_transition_to(next);
            if !ok {
                refused_from = Some(current.to_string());
            }
            ok
        });
        match refused_from {
            Some(from) => warn!("refused connection transition {from} -> {label}"),
            None => debug!("connection state -> {label}"),
        }
        applied
    }

    pub fn observe_connection(&self) -> StateStream<ConnectionState> {
        self.connection.subscribe()
    }

    // ── Pairing ───────────────────────────────────────────────────

    pub fn pairing(&self) -> PairingState {
        self.pairing.get()
    }

    pub fn set_pairing(&self, state: PairingState) {
        debug!("pairing state -> {state}");
        self.pairing.set(state);
    }

    pub fn observe_pairing(&self) -> StateStream<PairingState> {
        self.pairing.subscribe()
    }

    // ── Pending pairing address ───────────────────────────────────

    pub fn set_pending_ip(&self, ip: impl Into<String>) {
        *self.pending_ip_slot() = Some(ip.into());
    }

    pub fn take_pending_ip(&self) -> Option<String> {
        self.pending_ip_slot().take()
    }

    pub fn clear_pending_ip(&self) {
        self.pending_ip_slot().take();
    }

    fn pending_ip_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.pending_ip
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Reset ─────────────────────────────────────────────────────

    /// Back to `Disconnected` / `None` with no pending address.
    ///
    /// Publishes only the values that actually change, so closing an idle
    /// session emits nothing.
    pub fn reset(&self) {
        self.clear_pending_ip();
        if !self.connection.get().is_disconnected() {
            self.transition(ConnectionState::Disconnected);
        }
        if self.pairing.get() != PairingState::None {
            self.set_pairing(PairingState::None);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(64)
    }
}
