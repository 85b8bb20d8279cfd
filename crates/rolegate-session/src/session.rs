// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session snapshots and the session status state machine.

use serde::{Deserialize, Serialize};

use rolegate_core::{Principal, Role};

// =============================================================================
// Session Status
// =============================================================================

/// Authentication status of the process-wide session.
///
/// Status drives every gating decision. The machine has no terminal state:
///
/// ```text
/// initializing    --(identity event: principal present)--> authenticated
/// initializing    --(identity event: no principal)-------> unauthenticated
/// authenticated   --(sign-out / no principal)------------> unauthenticated
/// unauthenticated --(identity event: principal present)--> authenticated
/// ```
///
/// `Initializing` is entered exactly once, before the first identity event,
/// and is never re-entered. A session in `Initializing` must not be treated
/// as either authenticated or unauthenticated by any consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Waiting for the first identity event.
    Initializing,
    /// A principal is signed in.
    Authenticated,
    /// No principal is signed in.
    Unauthenticated,
}

impl SessionStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Unauthenticated => "unauthenticated",
        }
    }

    /// Returns `true` if the machine may move from `self` to `next`.
    ///
    /// Self-loops (duplicate identity events) are allowed; re-entering
    /// `Initializing` is not.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        match (self, next) {
            (SessionStatus::Initializing, _) => true,
            (_, SessionStatus::Initializing) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Session
// =============================================================================

/// A read-only snapshot of who is currently using the system.
///
/// Sessions are replaced whole, never mutated in place: the manager publishes
/// a new snapshot on every identity transition and consumers only ever hold
/// clones. The `epoch` increases with every replacement and serves as the
/// session identity token the route guard compares before issuing redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Current authentication status.
    pub status: SessionStatus,
    /// Principal id, present only when authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    /// Contact email, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Resolved role; meaningful only when authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    /// Monotonically increasing replacement counter.
    epoch: u64,
}

impl Session {
    /// The snapshot published before the first identity event.
    pub fn initializing() -> Self {
        Self {
            status: SessionStatus::Initializing,
            principal_id: None,
            email: None,
            display_name: None,
            role: None,
            epoch: 0,
        }
    }

    /// The unauthenticated sentinel.
    pub fn unauthenticated(epoch: u64) -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            principal_id: None,
            email: None,
            display_name: None,
            role: None,
            epoch,
        }
    }

    /// An authenticated snapshot for a principal with a resolved role.
    pub fn authenticated(principal: &Principal, role: Role, epoch: u64) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            principal_id: Some(principal.id.clone()),
            email: principal.email.clone(),
            display_name: principal.display_name.clone(),
            role: Some(role),
            epoch,
        }
    }

    /// Returns `true` if a principal is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Returns `true` if no principal is signed in.
    pub fn is_unauthenticated(&self) -> bool {
        self.status == SessionStatus::Unauthenticated
    }

    /// Returns `true` if the first identity event has not yet arrived.
    pub fn is_initializing(&self) -> bool {
        self.status == SessionStatus::Initializing
    }

    /// Returns the resolved role, present only when authenticated.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Returns the session identity token.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the best label for the actor behind this session, for audit
    /// entries: the email when known, otherwise the principal id.
    pub fn actor_label(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }
        self.email.clone().or_else(|| self.principal_id.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal::new("u1").with_email("u1@example.com")
    }

    #[test]
    fn test_state_machine_edges() {
        use SessionStatus::*;

        // Listed edges.
        assert!(Initializing.can_transition_to(Authenticated));
        assert!(Initializing.can_transition_to(Unauthenticated));
        assert!(Authenticated.can_transition_to(Unauthenticated));
        assert!(Unauthenticated.can_transition_to(Authenticated));

        // Duplicate events are self-loops, not transitions.
        assert!(Authenticated.can_transition_to(Authenticated));
        assert!(Unauthenticated.can_transition_to(Unauthenticated));

        // Initializing is never re-entered.
        assert!(!Authenticated.can_transition_to(Initializing));
        assert!(!Unauthenticated.can_transition_to(Initializing));
    }

    #[test]
    fn test_initializing_is_neither() {
        let session = Session::initializing();

        assert!(session.is_initializing());
        assert!(!session.is_authenticated());
        assert!(!session.is_unauthenticated());
        assert!(session.role().is_none());
        assert_eq!(session.epoch(), 0);
    }

    #[test]
    fn test_authenticated_snapshot() {
        let session = Session::authenticated(&principal(), Role::Manager, 3);

        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Manager));
        assert_eq!(session.principal_id.as_deref(), Some("u1"));
        assert_eq!(session.epoch(), 3);
    }

    #[test]
    fn test_unauthenticated_clears_identity() {
        let session = Session::unauthenticated(5);

        assert!(session.is_unauthenticated());
        assert!(session.principal_id.is_none());
        assert!(session.role().is_none());
        assert!(session.actor_label().is_none());
    }

    #[test]
    fn test_actor_label_prefers_email() {
        let with_email = Session::authenticated(&principal(), Role::Employee, 1);
        assert_eq!(with_email.actor_label().as_deref(), Some("u1@example.com"));

        let without_email = Session::authenticated(&Principal::new("u2"), Role::Employee, 2);
        assert_eq!(without_email.actor_label().as_deref(), Some("u2"));
    }
}
