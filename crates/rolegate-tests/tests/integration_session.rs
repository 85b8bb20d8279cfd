// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for the session lifecycle: identity events, role
//! resolution, offline degradation, and the session-mutating operations.

use std::time::Duration;

use rolegate_core::{AuthError, ConnectivityState, DocumentStore, Role, RolegateError};
use rolegate_session::{SessionStatus, SignUpRequest};
use rolegate_tests::common::{principal, seed_profile, SessionHarness};

// =============================================================================
// State machine
// =============================================================================

#[tokio::test]
async fn session_status_follows_identity_events() {
    let h = SessionHarness::new();
    h.manager.initialize();

    // Before any event: initializing.
    assert_eq!(h.manager.current().status, SessionStatus::Initializing);

    // No principal: unauthenticated.
    h.provider.emit(None);
    h.wait_for_status(SessionStatus::Unauthenticated).await;

    // Principal present: authenticated.
    seed_profile(&h.store, "u1", Role::Employee).await;
    h.provider.emit(Some(principal("u1")));
    h.wait_for_status(SessionStatus::Authenticated).await;

    // Principal gone again: unauthenticated.
    h.provider.emit(None);
    h.wait_for_status(SessionStatus::Unauthenticated).await;

    // Initializing is never re-entered after the first event.
    assert_ne!(h.manager.current().status, SessionStatus::Initializing);
}

#[tokio::test]
async fn duplicate_identity_events_are_tolerated() {
    let h = SessionHarness::new();
    h.manager.initialize();

    seed_profile(&h.store, "u1", Role::Manager).await;
    h.provider.emit(Some(principal("u1")));
    let first = h.wait_for_status(SessionStatus::Authenticated).await;

    // The same principal arriving again replaces the snapshot wholesale.
    h.provider.emit(Some(principal("u1")));
    let second = h
        .manager
        .subscribe()
        .borrow()
        .clone();

    // Wait until the second event is processed (epoch advances).
    let second = if second.epoch() > first.epoch() {
        second
    } else {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.manager.current()
    };

    assert_eq!(second.status, SessionStatus::Authenticated);
    assert_eq!(second.role(), Some(Role::Manager));
    assert!(second.epoch() > first.epoch());
}

// =============================================================================
// Role resolution scenarios
// =============================================================================

#[tokio::test]
async fn sign_in_resolves_role_from_profile() {
    let h = SessionHarness::new();
    h.provider.register_with_id("u1@example.com", "password1", "u1");
    seed_profile(&h.store, "u1", Role::Manager).await;

    let session = h.manager.sign_in("u1@example.com", "password1").await.unwrap();

    assert_eq!(session.principal_id.as_deref(), Some("u1"));
    assert_eq!(session.role(), Some(Role::Manager));
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(
        h.manager.connectivity().state(),
        ConnectivityState::Online
    );
}

#[tokio::test]
async fn sign_in_degrades_to_employee_when_store_unreachable() {
    let h = SessionHarness::new();
    h.provider.register_with_id("u2@example.com", "password1", "u2");
    h.store.fail_all_gets(true);

    let session = h.manager.sign_in("u2@example.com", "password1").await.unwrap();

    assert_eq!(session.principal_id.as_deref(), Some("u2"));
    assert_eq!(session.role(), Some(Role::Employee));
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(
        h.manager.connectivity().state(),
        ConnectivityState::Offline
    );
}

#[tokio::test]
async fn resolution_is_bounded_when_store_is_down() {
    let h = SessionHarness::new();
    h.manager.initialize();
    h.store.fail_all_gets(true);

    let started = std::time::Instant::now();
    h.provider.emit(Some(principal("u3")));
    let session = h.wait_for_status(SessionStatus::Authenticated).await;

    // Three attempts with millisecond backoff: completes promptly, never
    // raises, always yields a role.
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.role(), Some(Role::Employee));

    // Exactly the configured attempt budget was spent on the lookup.
    assert_eq!(h.store.get_count(), 3);
}

#[tokio::test]
async fn unknown_principal_gets_synthesized_profile() {
    let h = SessionHarness::new();
    h.manager.initialize();

    h.provider.emit(Some(principal("fresh")));
    let session = h.wait_for_status(SessionStatus::Authenticated).await;

    assert_eq!(session.role(), Some(Role::Employee));

    // The default profile landed in the users collection.
    let doc = h.store.inner().get("users", "fresh").await.unwrap().unwrap();
    assert_eq!(doc.get("role").and_then(|v| v.as_str()), Some("employee"));
}

#[tokio::test]
async fn transient_failures_recover_within_budget() {
    let h = SessionHarness::new();
    h.provider.register_with_id("u1@example.com", "password1", "u1");
    seed_profile(&h.store, "u1", Role::Admin).await;
    h.store.fail_next_gets(2);

    let session = h.manager.sign_in("u1@example.com", "password1").await.unwrap();

    assert_eq!(session.role(), Some(Role::Admin));
    assert!(!h.manager.connectivity().is_offline());
}

// =============================================================================
// Offline behavior
// =============================================================================

#[tokio::test]
async fn offline_transition_retains_authenticated_session() {
    let h = SessionHarness::new();
    h.provider.register_with_id("u1@example.com", "password1", "u1");
    seed_profile(&h.store, "u1", Role::Manager).await;

    let before = h.manager.sign_in("u1@example.com", "password1").await.unwrap();

    // Connectivity drops; nothing else happens.
    h.store.fail_enable_network(true);
    assert!(!h.manager.retry_connection().await);
    assert!(h.manager.connectivity().is_offline());

    // The session keeps its last known role.
    let after = h.manager.current();
    assert_eq!(after.status, SessionStatus::Authenticated);
    assert_eq!(after.role(), before.role());
}

#[tokio::test]
async fn retry_connection_reports_success() {
    let h = SessionHarness::new();

    h.store.fail_enable_network(true);
    assert!(!h.manager.retry_connection().await);

    h.store.fail_enable_network(false);
    assert!(h.manager.retry_connection().await);
    assert!(!h.manager.connectivity().is_offline());
}

// =============================================================================
// Sign-in / sign-up / sign-out
// =============================================================================

#[tokio::test]
async fn failed_sign_in_surfaces_error_and_keeps_session() {
    let h = SessionHarness::new();
    h.provider.register_with_id("u1@example.com", "password1", "u1");

    let before = h.manager.current();
    let err = h.manager.sign_in("u1@example.com", "wrong").await.unwrap_err();

    assert!(matches!(
        err,
        RolegateError::Auth(AuthError::InvalidCredentials { .. })
    ));
    assert_eq!(h.manager.current(), before);
}

#[tokio::test]
async fn overlapping_sign_ins_are_rejected() {
    let h = SessionHarness::new();
    h.provider.register_with_id("u1@example.com", "password1", "u1");

    // Slow the profile lookup down so the first sign-in holds the gate.
    h.store.set_get_latency(Duration::from_millis(150));

    let manager = h.manager.clone();
    let first = tokio::spawn(async move {
        manager.sign_in("u1@example.com", "password1").await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;

    let err = h
        .manager
        .sign_in("u1@example.com", "password1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RolegateError::Auth(AuthError::OperationInFlight)
    ));

    // The first operation is unaffected by the rejected overlap.
    let session = first.await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);
}

#[tokio::test]
async fn sign_up_with_code_approval() {
    use std::sync::Arc;

    use rolegate_core::InMemoryAuditLogger;
    use rolegate_session::{CodeListApproval, SessionManager};
    use rolegate_tests::common::{fast_config, FlakyStore, MockIdentityProvider};

    let provider = MockIdentityProvider::new();
    let store = FlakyStore::new();
    let approval = CodeListApproval::new(Arc::new(store.clone()), "verification_codes");
    approval.seed_defaults().await.unwrap();

    let manager = SessionManager::builder()
        .identity(Arc::new(provider.clone()))
        .store(Arc::new(store.clone()))
        .audit(Arc::new(InMemoryAuditLogger::new()))
        .approval(Arc::new(approval))
        .config(fast_config())
        .build()
        .unwrap();

    // Wrong code: rejected before the account exists.
    let err = manager
        .sign_up(
            SignUpRequest::new("boss@example.com", "longenough", "admin")
                .with_approval_evidence("000000"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RolegateError::Auth(AuthError::ApprovalRejected { .. })
    ));
    assert!(provider.current().is_none());

    // Accepted code: admin session established.
    let session = manager
        .sign_up(
            SignUpRequest::new("boss@example.com", "longenough", "admin")
                .with_approval_evidence("666666"),
        )
        .await
        .unwrap();
    assert_eq!(session.role(), Some(Role::Admin));
}

#[tokio::test]
async fn sign_up_survives_profile_write_failure() {
    let h = SessionHarness::approving_elevated();

    // Writes go through the inner memory store; disable its network so the
    // profile write fails while the identity provider still succeeds.
    h.store.inner().disable_network().await.unwrap();

    let session = h
        .manager
        .sign_up(SignUpRequest::new("new@example.com", "longenough", "manager"))
        .await
        .unwrap();

    // The operation still succeeded from the identity provider's view.
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.role(), Some(Role::Manager));
    assert!(h.provider.current().is_some());
}

#[tokio::test]
async fn sign_out_without_active_session_skips_audit() {
    let h = SessionHarness::new();

    h.manager.sign_out().await.unwrap();

    assert_eq!(h.manager.current().status, SessionStatus::Unauthenticated);
    assert_eq!(h.provider.sign_out_count(), 1);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn audit_trail_records_lifecycle() {
    use rolegate_core::AuditAction;

    let h = SessionHarness::new();
    h.provider.register_with_id("u1@example.com", "password1", "u1");
    seed_profile(&h.store, "u1", Role::Employee).await;

    h.manager.sign_in("u1@example.com", "password1").await.unwrap();
    h.manager.sign_out().await.unwrap();
    h.manager.reset_password("u1@example.com").await.unwrap();

    h.wait_for_audit_entries(3).await;

    assert_eq!(h.audit.entries_for_action(AuditAction::SignIn).len(), 1);
    assert_eq!(h.audit.entries_for_action(AuditAction::SignOut).len(), 1);
    assert_eq!(
        h.audit.entries_for_action(AuditAction::PasswordReset).len(),
        1
    );
}

#[tokio::test]
async fn audit_failure_does_not_fail_sign_in() {
    use std::sync::Arc;

    use rolegate_core::{MemoryStore, StoreAuditLogger, UserProfile};
    use rolegate_session::SessionManager;
    use rolegate_tests::common::{fast_config, MockIdentityProvider};

    let provider = MockIdentityProvider::new();
    provider.register_with_id("u1@example.com", "password1", "u1");

    // Profiles live in a healthy store; the audit trail lives in a store
    // that is offline, so every audit write fails.
    let profile_store = MemoryStore::new();
    profile_store
        .set(
            "users",
            "u1",
            UserProfile::new("u1", Role::Manager).to_document(),
            false,
        )
        .await
        .unwrap();

    let audit_store = MemoryStore::new();
    audit_store.disable_network().await.unwrap();

    let manager = SessionManager::builder()
        .identity(Arc::new(provider))
        .store(Arc::new(profile_store))
        .audit(Arc::new(StoreAuditLogger::new(
            Arc::new(audit_store),
            "audit_logs",
        )))
        .config(fast_config())
        .build()
        .unwrap();

    let session = manager.sign_in("u1@example.com", "password1").await.unwrap();

    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.role(), Some(Role::Manager));
}
