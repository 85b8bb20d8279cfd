// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role resolution.
//!
//! Resolution turns a principal into a role by looking up the profile record
//! in the document store. It never raises past this module: a role is always
//! produced, degrading to the default role when the store is unreachable.
//!
//! The algorithm:
//!
//! 1. Fetch the profile by principal id, with a per-attempt timeout.
//! 2. On a transient error, retry with linear backoff (1×, 2×, 3× the base
//!    delay), up to the configured attempt budget. Not-found is a definitive
//!    answer and is never retried.
//! 3. Found: use the profile's role, defaulting when the field is absent.
//! 4. Not found: treat as a new principal — synthesize a default employee
//!    profile and persist it best-effort.
//! 5. All attempts errored: fall back to the default role, mark connectivity
//!    offline, persist nothing.

use std::sync::Arc;
use std::time::Duration;

use rolegate_core::retry::{LinearBackoff, RetryDecision, RetryStrategy};
use rolegate_core::store::Document;
use rolegate_core::{
    ConnectivityGate, DocumentStore, Principal, Role, StoreError, StoreResult, UserProfile,
};

use crate::config::SessionConfig;

// =============================================================================
// Resolution Outcome
// =============================================================================

/// How a role was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The profile existed and supplied the role.
    Found,
    /// No profile existed; a default one was synthesized.
    Defaulted,
    /// Every attempt failed; the default role was assumed offline.
    Offline,
}

/// The product of role resolution: a role, always.
#[derive(Debug, Clone)]
pub struct ResolvedRole {
    /// The resolved role.
    pub role: Role,
    /// The profile backing the role, when one exists or was synthesized.
    pub profile: Option<UserProfile>,
    /// How the role was arrived at.
    pub outcome: ResolutionOutcome,
}

// =============================================================================
// Role Resolver
// =============================================================================

/// Resolves roles for principals against the profile store.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn DocumentStore>,
    connectivity: ConnectivityGate,
    backoff: LinearBackoff,
    users_collection: String,
    attempt_timeout: Duration,
}

impl RoleResolver {
    /// Creates a resolver from the session configuration.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        connectivity: ConnectivityGate,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            connectivity,
            backoff: LinearBackoff::new(config.retry.clone()),
            users_collection: config.collections.users.clone(),
            attempt_timeout: config.attempt_timeout,
        }
    }

    /// Resolves the role for a principal. Never fails.
    pub async fn resolve(&self, principal: &Principal) -> ResolvedRole {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.attempt_get(&principal.id).await {
                Ok(Some(doc)) => {
                    let profile = UserProfile::from_document(&principal.id, &doc);
                    self.connectivity.mark_online();

                    tracing::debug!(
                        principal_id = %principal.id,
                        role = %profile.role,
                        "Resolved role from profile"
                    );

                    return ResolvedRole {
                        role: profile.role,
                        profile: Some(profile),
                        outcome: ResolutionOutcome::Found,
                    };
                }
                Ok(None) => {
                    // New principal: synthesize a default profile. The write
                    // is best-effort; the next identity event re-resolves.
                    let profile = UserProfile::default_for(principal);

                    if let Err(e) = self
                        .store
                        .set(
                            &self.users_collection,
                            &principal.id,
                            profile.to_document(),
                            false,
                        )
                        .await
                    {
                        tracing::warn!(
                            principal_id = %principal.id,
                            error = %e,
                            "Failed to persist default profile"
                        );
                    }

                    self.connectivity.mark_online();

                    return ResolvedRole {
                        role: profile.role,
                        profile: Some(profile),
                        outcome: ResolutionOutcome::Defaulted,
                    };
                }
                Err(error) => match self.backoff.should_retry(&error, attempt) {
                    RetryDecision::Retry(delay) => {
                        tracing::debug!(
                            principal_id = %principal.id,
                            attempt = attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Profile lookup failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry => {
                        tracing::warn!(
                            principal_id = %principal.id,
                            attempts = attempt,
                            error = %error,
                            "Profile lookup exhausted retries, assuming default role offline"
                        );
                        self.connectivity.mark_offline();

                        return ResolvedRole {
                            role: Role::default(),
                            profile: None,
                            outcome: ResolutionOutcome::Offline,
                        };
                    }
                },
            }
        }
    }

    async fn attempt_get(&self, principal_id: &str) -> StoreResult<Option<Document>> {
        match tokio::time::timeout(
            self.attempt_timeout,
            self.store.get(&self.users_collection, principal_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::timeout(self.attempt_timeout)),
        }
    }
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver")
            .field("users_collection", &self.users_collection)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use rolegate_core::retry::RetryConfig;
    use rolegate_core::store::Query;
    use rolegate_core::MemoryStore;

    /// Store that errors a configurable number of times before delegating.
    struct FailingStore {
        inner: MemoryStore,
        failures_remaining: AtomicU32,
        get_count: AtomicU32,
    }

    impl FailingStore {
        fn failing(times: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures_remaining: AtomicU32::new(times),
                get_count: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
            self.get_count.fetch_add(1, Ordering::SeqCst);

            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::unavailable("simulated outage"));
            }

            self.inner.get(collection, id).await
        }

        async fn set(&self, collection: &str, id: &str, doc: Document, merge: bool) -> StoreResult<()> {
            self.inner.set(collection, id, doc, merge).await
        }

        async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
            self.inner.update(collection, id, fields).await
        }

        async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
            self.inner.delete(collection, id).await
        }

        async fn add(&self, collection: &str, doc: Document) -> StoreResult<String> {
            self.inner.add(collection, doc).await
        }

        async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<(String, Document)>> {
            self.inner.query(collection, query).await
        }
    }

    fn fast_config() -> SessionConfig {
        SessionConfig::default()
            .with_retry(RetryConfig::new().with_base_delay(Duration::from_millis(2)))
            .with_attempt_timeout(Duration::from_millis(200))
    }

    fn resolver_with(store: Arc<dyn DocumentStore>) -> (RoleResolver, ConnectivityGate) {
        let gate = ConnectivityGate::new();
        let resolver = RoleResolver::new(store, gate.clone(), &fast_config());
        (resolver, gate)
    }

    #[tokio::test]
    async fn test_resolves_existing_profile() {
        let store = MemoryStore::new();
        let profile = UserProfile::new("u1", Role::Manager);
        store
            .set("users", "u1", profile.to_document(), false)
            .await
            .unwrap();

        let (resolver, gate) = resolver_with(Arc::new(store));
        let resolved = resolver.resolve(&Principal::new("u1")).await;

        assert_eq!(resolved.role, Role::Manager);
        assert_eq!(resolved.outcome, ResolutionOutcome::Found);
        assert!(!gate.is_offline());
    }

    #[tokio::test]
    async fn test_synthesizes_default_for_unknown_principal() {
        let store = MemoryStore::new();
        let (resolver, _gate) = resolver_with(Arc::new(store.clone()));

        let principal = Principal::new("fresh").with_email("fresh@example.com");
        let resolved = resolver.resolve(&principal).await;

        assert_eq!(resolved.role, Role::Employee);
        assert_eq!(resolved.outcome, ResolutionOutcome::Defaulted);

        // The default profile was persisted.
        let doc = store.get("users", "fresh").await.unwrap().unwrap();
        assert_eq!(doc.get("role").and_then(|v| v.as_str()), Some("employee"));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let store = Arc::new(FailingStore::failing(2));
        let profile = UserProfile::new("u1", Role::Admin);
        store
            .inner
            .set("users", "u1", profile.to_document(), false)
            .await
            .unwrap();

        let (resolver, gate) = resolver_with(store.clone());
        let resolved = resolver.resolve(&Principal::new("u1")).await;

        assert_eq!(resolved.role, Role::Admin);
        assert_eq!(resolved.outcome, ResolutionOutcome::Found);
        assert_eq!(store.get_count.load(Ordering::SeqCst), 3);
        assert!(!gate.is_offline());
    }

    #[tokio::test]
    async fn test_falls_back_to_employee_when_store_down() {
        let store = Arc::new(FailingStore::failing(u32::MAX));
        let (resolver, gate) = resolver_with(store.clone());

        let resolved = resolver.resolve(&Principal::new("u2")).await;

        assert_eq!(resolved.role, Role::Employee);
        assert_eq!(resolved.outcome, ResolutionOutcome::Offline);
        assert!(resolved.profile.is_none());
        assert!(gate.is_offline());

        // Bounded: exactly the configured attempt budget.
        assert_eq!(store.get_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_restores_online_state() {
        let store = MemoryStore::new();
        let (resolver, gate) = resolver_with(Arc::new(store));

        gate.mark_offline();
        resolver.resolve(&Principal::new("u3")).await;

        assert!(!gate.is_offline());
    }
}
