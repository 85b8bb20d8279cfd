// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Prebuilt principals, profiles and seeded stores for integration tests.

use rolegate_core::{DocumentStore, Principal, Role, UserProfile};
use rolegate_session::Session;

use super::mocks::FlakyStore;

/// A principal with a stable id and email.
pub fn principal(id: &str) -> Principal {
    Principal::new(id).with_email(format!("{}@example.com", id))
}

/// An authenticated session snapshot for assertions and policy checks.
pub fn session_for(id: &str, role: Role, epoch: u64) -> Session {
    Session::authenticated(&principal(id), role, epoch)
}

/// Seeds a profile document into the store's users collection.
pub async fn seed_profile(store: &FlakyStore, id: &str, role: Role) -> UserProfile {
    let profile = UserProfile::new(id, role).with_email(format!("{}@example.com", id));

    store
        .inner()
        .set("users", id, profile.to_document(), false)
        .await
        .expect("seeding profile");

    profile
}

/// Seeds one profile per role, returning them admin-first.
pub async fn seed_one_per_role(store: &FlakyStore) -> Vec<UserProfile> {
    let mut profiles = Vec::new();
    for (id, role) in [
        ("admin-1", Role::Admin),
        ("mgr-1", Role::Manager),
        ("emp-1", Role::Employee),
    ] {
        profiles.push(seed_profile(store, id, role).await);
    }
    profiles
}
