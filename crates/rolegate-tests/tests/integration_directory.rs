// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for the user directory: server-side policy enforcement
//! and the store-backed audit trail.

use std::sync::Arc;

use rolegate_core::{
    AccountStatus, AuditAction, AuditFilter, AuditLogger, DocumentStore, Role, RolegateError,
    StoreAuditLogger,
};
use rolegate_session::{AccessPolicy, SessionStatus, SignUpRequest, UserDirectory, UserUpdate};
use rolegate_tests::common::{
    fast_config, seed_one_per_role, seed_profile, session_for, SessionHarness,
};

#[tokio::test]
async fn admin_manages_users_end_to_end() {
    let h = SessionHarness::new();
    let directory = h.directory();
    let admin = session_for("admin-1", Role::Admin, 1);

    let created = directory
        .create_user(
            &admin,
            "new@example.com",
            "longenough",
            Role::Employee,
            AccountStatus::Pending,
        )
        .await
        .unwrap();
    assert_eq!(created.status, AccountStatus::Pending);

    let updated = directory
        .update_user(
            &admin,
            &created.id,
            UserUpdate::new().status(AccountStatus::Active).name("New User"),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AccountStatus::Active);
    assert_eq!(updated.name.as_deref(), Some("New User"));

    directory.delete_user(&admin, &created.id).await.unwrap();
    assert!(directory.get_user(&admin, &created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn policy_is_enforced_regardless_of_client_gating() {
    let h = SessionHarness::new();
    let directory = h.directory();
    seed_profile(&h.store, "victim", Role::Employee).await;

    // An employee session reaching the directory directly, bypassing any
    // client-side route gate, is still denied.
    let employee = session_for("emp-1", Role::Employee, 1);

    assert!(matches!(
        directory.list_users(&employee).await.unwrap_err(),
        RolegateError::Auth(_)
    ));
    assert!(matches!(
        directory
            .update_user(&employee, "victim", UserUpdate::new().role(Role::Admin))
            .await
            .unwrap_err(),
        RolegateError::Auth(_)
    ));
    assert!(matches!(
        directory.delete_user(&employee, "victim").await.unwrap_err(),
        RolegateError::Auth(_)
    ));

    // The victim's profile is untouched.
    let doc = h.store.inner().get("users", "victim").await.unwrap().unwrap();
    assert_eq!(doc.get("role").and_then(|v| v.as_str()), Some("employee"));

    // Every denial was audited.
    h.wait_for_audit_entries(3).await;
    assert_eq!(h.audit.failed_entries().len(), 3);
}

#[tokio::test]
async fn unauthenticated_and_initializing_sessions_are_denied() {
    let h = SessionHarness::new();
    let directory = h.directory();

    let unauthenticated = rolegate_session::Session::unauthenticated(1);
    let initializing = rolegate_session::Session::initializing();

    assert!(directory.list_users(&unauthenticated).await.is_err());
    assert!(directory.list_users(&initializing).await.is_err());
}

#[tokio::test]
async fn listings_are_ordered_and_filtered() {
    let h = SessionHarness::new();
    let directory = h.directory();
    seed_one_per_role(&h.store).await;

    let admin = session_for("admin-1", Role::Admin, 1);

    let all = directory.list_users(&admin).await.unwrap();
    assert_eq!(all.len(), 3);

    let managers = directory.users_by_role(&admin, Role::Manager).await.unwrap();
    assert_eq!(managers.len(), 1);
    assert_eq!(managers[0].role, Role::Manager);
}

#[tokio::test]
async fn role_changes_land_in_store_backed_audit_trail() {
    let h = SessionHarness::new();

    // Wire a directory whose audit trail lives in the document store, the
    // way the production composition does.
    let audit = Arc::new(StoreAuditLogger::new(
        Arc::new(h.store.clone()),
        "audit_logs",
    ));
    let directory = UserDirectory::new(
        Arc::new(h.store.clone()),
        Arc::new(h.provider.clone()),
        audit.clone(),
        AccessPolicy::new(),
        &fast_config(),
    );

    seed_profile(&h.store, "u1", Role::Employee).await;
    let admin = session_for("admin-1", Role::Admin, 1);

    directory
        .update_user(&admin, "u1", UserUpdate::new().role(Role::Manager))
        .await
        .unwrap();

    // The entry is queryable back out of the collection.
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            let entries = audit
                .query(AuditFilter::new().action(AuditAction::RoleChange))
                .await
                .unwrap();
            if !entries.is_empty() {
                assert_eq!(entries[0].actor.as_deref(), Some("admin-1@example.com"));
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("role change audit entry never appeared");
}

#[tokio::test]
async fn self_service_sign_up_is_visible_to_the_directory() {
    let h = SessionHarness::new();
    let directory = h.directory();

    let session = h
        .manager
        .sign_up(SignUpRequest::new("self@example.com", "longenough", "employee"))
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);

    let admin = session_for("admin-1", Role::Admin, 1);
    let users = directory.list_users(&admin).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email.as_deref(), Some("self@example.com"));
    assert_eq!(users[0].role, Role::Employee);
}
