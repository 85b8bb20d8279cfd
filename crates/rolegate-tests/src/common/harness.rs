// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! Wires a session manager to the mocks with fast retry timing and provides
//! wait helpers for observing session transitions.

use std::sync::Arc;
use std::time::Duration;

use rolegate_core::retry::RetryConfig;
use rolegate_core::{ConnectivityGate, InMemoryAuditLogger};
use rolegate_session::{
    AccessPolicy, AllowElevated, ElevatedRoleApprovalPolicy, Session, SessionConfig,
    SessionManager, SessionStatus, UserDirectory,
};

use super::mocks::{FlakyStore, MockIdentityProvider};

/// How long wait helpers poll before giving up.
const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Initializes test tracing once; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A session configuration with millisecond-scale retry timing.
pub fn fast_config() -> SessionConfig {
    SessionConfig::default()
        .with_retry(RetryConfig::new().with_base_delay(Duration::from_millis(2)))
        .with_attempt_timeout(Duration::from_millis(250))
}

// =============================================================================
// Session Harness
// =============================================================================

/// A fully wired session manager with mock collaborators.
pub struct SessionHarness {
    /// The manager under test.
    pub manager: Arc<SessionManager>,
    /// The scripted identity provider.
    pub provider: MockIdentityProvider,
    /// The store with error injection.
    pub store: FlakyStore,
    /// The recording audit logger.
    pub audit: InMemoryAuditLogger,
}

impl SessionHarness {
    /// Builds a harness with the default (deny-elevated) approval policy.
    pub fn new() -> Self {
        Self::with_approval(None)
    }

    /// Builds a harness that approves every elevated sign-up.
    pub fn approving_elevated() -> Self {
        Self::with_approval(Some(Arc::new(AllowElevated)))
    }

    fn with_approval(approval: Option<Arc<dyn ElevatedRoleApprovalPolicy>>) -> Self {
        init_tracing();

        let provider = MockIdentityProvider::new();
        let store = FlakyStore::new();
        let audit = InMemoryAuditLogger::new();

        let mut builder = SessionManager::builder()
            .identity(Arc::new(provider.clone()))
            .store(Arc::new(store.clone()))
            .audit(Arc::new(audit.clone()))
            .connectivity(ConnectivityGate::new())
            .config(fast_config());

        if let Some(approval) = approval {
            builder = builder.approval(approval);
        }

        let manager = builder.build().expect("building session manager");

        Self {
            manager,
            provider,
            store,
            audit,
        }
    }

    /// Builds a directory sharing this harness's store and audit trail.
    pub fn directory(&self) -> UserDirectory {
        UserDirectory::new(
            Arc::new(self.store.clone()),
            Arc::new(self.provider.clone()),
            Arc::new(self.audit.clone()),
            AccessPolicy::new(),
            &fast_config(),
        )
    }

    /// Waits until the published session reaches the given status.
    pub async fn wait_for_status(&self, status: SessionStatus) -> Session {
        let mut rx = self.manager.subscribe();

        tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                if rx.borrow().status == status {
                    return rx.borrow().clone();
                }
                rx.changed().await.expect("session channel closed");
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "session did not reach {} (currently {})",
                status,
                self.manager.current().status
            )
        })
    }

    /// Waits until the audit trail holds at least `n` entries.
    pub async fn wait_for_audit_entries(&self, n: usize) {
        tokio::time::timeout(WAIT_TIMEOUT, async {
            while self.audit.len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "audit trail holds {} entries, expected at least {}",
                self.audit.len(),
                n
            )
        });
    }
}

impl Default for SessionHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionHarness {
    fn drop(&mut self) {
        self.manager.shutdown();
    }
}
