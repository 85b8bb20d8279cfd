// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Connectivity state tracking.
//!
//! Connectivity is independent of the session: going offline never
//! invalidates an authenticated session, it only changes whether profile
//! lookups are attempted remotely. The gate is the single place the rest of
//! the system reads and flips that state.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

// =============================================================================
// Connectivity State
// =============================================================================

/// Whether remote store access is currently believed to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Remote access is available.
    #[default]
    Online,
    /// Remote access failed recently; lookups fall back to defaults.
    Offline,
}

impl ConnectivityState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Online => "online",
            ConnectivityState::Offline => "offline",
        }
    }
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Connectivity Gate
// =============================================================================

/// Observable connectivity flag.
///
/// Clones share the same underlying state. Consumers either poll
/// [`state`](ConnectivityGate::state) or watch for transitions via
/// [`subscribe`](ConnectivityGate::subscribe).
#[derive(Debug, Clone)]
pub struct ConnectivityGate {
    tx: watch::Sender<ConnectivityState>,
}

impl ConnectivityGate {
    /// Creates a new gate in the online state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectivityState::Online);
        Self { tx }
    }

    /// Returns the current state.
    pub fn state(&self) -> ConnectivityState {
        *self.tx.borrow()
    }

    /// Returns `true` if currently offline.
    pub fn is_offline(&self) -> bool {
        self.state() == ConnectivityState::Offline
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }

    /// Marks the gate offline.
    pub fn mark_offline(&self) {
        if self.tx.send_replace(ConnectivityState::Offline) == ConnectivityState::Online {
            tracing::warn!("Store connectivity lost, degrading to offline defaults");
        }
    }

    /// Marks the gate online.
    pub fn mark_online(&self) {
        if self.tx.send_replace(ConnectivityState::Online) == ConnectivityState::Offline {
            tracing::info!("Store connectivity restored");
        }
    }
}

impl Default for ConnectivityGate {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_starts_online() {
        let gate = ConnectivityGate::new();
        assert_eq!(gate.state(), ConnectivityState::Online);
        assert!(!gate.is_offline());
    }

    #[test]
    fn test_gate_transitions() {
        let gate = ConnectivityGate::new();

        gate.mark_offline();
        assert!(gate.is_offline());

        gate.mark_online();
        assert!(!gate.is_offline());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = ConnectivityGate::new();
        let clone = gate.clone();

        gate.mark_offline();
        assert!(clone.is_offline());
    }

    #[tokio::test]
    async fn test_subscribe_observes_transitions() {
        let gate = ConnectivityGate::new();
        let mut rx = gate.subscribe();

        gate.mark_offline();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectivityState::Offline);
    }
}
