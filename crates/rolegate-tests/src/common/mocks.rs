// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Mock implementations for testing rolegate components in isolation.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different test scenarios
//! - Recording of interactions for verification
//! - Thread-safe for concurrent testing
//! - Easy to set up error injection

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use rolegate_core::store::{Document, DocumentStore, Query};
use rolegate_core::{AuthError, MemoryStore, Principal, StoreError, StoreResult};
use rolegate_session::identity::{IdentityEvents, IdentityProvider};

/// Capacity of the mock identity event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Mock Identity Provider
// =============================================================================

struct MockAccount {
    secret: String,
    principal: Principal,
    disabled: bool,
}

/// A scripted identity provider for tests.
///
/// Unlike the in-process provider shipped with the session crate, this mock
/// does not replay the current identity on subscribe: tests control every
/// event explicitly through [`emit`](MockIdentityProvider::emit), so a
/// freshly initialized manager stays in the initializing state until the
/// test says otherwise.
#[derive(Clone)]
pub struct MockIdentityProvider {
    accounts: Arc<DashMap<String, MockAccount>>,
    current: Arc<RwLock<Option<Principal>>>,
    events: broadcast::Sender<Option<Principal>>,

    fail_next_sign_in: Arc<AtomicBool>,
    sign_in_count: Arc<AtomicU64>,
    sign_out_count: Arc<AtomicU64>,
}

impl MockIdentityProvider {
    /// Creates a new mock with no accounts.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accounts: Arc::new(DashMap::new()),
            current: Arc::new(RwLock::new(None)),
            events,
            fail_next_sign_in: Arc::new(AtomicBool::new(false)),
            sign_in_count: Arc::new(AtomicU64::new(0)),
            sign_out_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers an account with an explicit principal id.
    pub fn register_with_id(
        &self,
        identifier: impl Into<String>,
        secret: impl Into<String>,
        principal_id: impl Into<String>,
    ) -> Principal {
        let identifier = identifier.into();
        let principal = Principal::new(principal_id).with_email(&identifier);

        self.accounts.insert(
            identifier,
            MockAccount {
                secret: secret.into(),
                principal: principal.clone(),
                disabled: false,
            },
        );

        principal
    }

    /// Seeds an account with an explicit principal id, builder style.
    pub fn with_account(
        self,
        identifier: impl Into<String>,
        secret: impl Into<String>,
        principal_id: impl Into<String>,
    ) -> Self {
        self.register_with_id(identifier, secret, principal_id);
        self
    }

    /// Disables an account.
    pub fn disable_account(&self, identifier: &str) {
        if let Some(mut account) = self.accounts.get_mut(identifier) {
            account.disabled = true;
        }
    }

    /// Pushes a raw identity event to all subscribers.
    pub fn emit(&self, event: Option<Principal>) {
        *self.current.write() = event.clone();
        let _ = self.events.send(event);
    }

    /// Forces the next sign-in to fail with a provider error.
    pub fn fail_next_sign_in(&self) {
        self.fail_next_sign_in.store(true, Ordering::SeqCst);
    }

    /// Returns how many sign-ins were attempted.
    pub fn sign_in_count(&self) -> u64 {
        self.sign_in_count.load(Ordering::SeqCst)
    }

    /// Returns how many sign-outs were performed.
    pub fn sign_out_count(&self) -> u64 {
        self.sign_out_count.load(Ordering::SeqCst)
    }

    /// Returns the currently signed-in principal.
    pub fn current(&self) -> Option<Principal> {
        self.current.read().clone()
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn subscribe(&self) -> IdentityEvents {
        self.events.subscribe()
    }

    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        self.sign_in_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_sign_in.swap(false, Ordering::SeqCst) {
            return Err(AuthError::provider("simulated provider outage"));
        }

        let principal = {
            let account = self
                .accounts
                .get(identifier)
                .ok_or_else(|| AuthError::unknown_account(identifier))?;

            if account.disabled {
                return Err(AuthError::account_disabled(identifier));
            }
            if account.secret != secret {
                return Err(AuthError::invalid_credentials("secret mismatch"));
            }

            account.principal.clone()
        };

        self.emit(Some(principal.clone()));
        Ok(principal)
    }

    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        if self.accounts.contains_key(identifier) {
            return Err(AuthError::account_exists(identifier));
        }

        let principal =
            self.register_with_id(identifier, secret, uuid::Uuid::now_v7().to_string());
        self.emit(Some(principal.clone()));

        Ok(principal)
    }

    async fn send_password_reset(&self, identifier: &str) -> Result<(), AuthError> {
        if !self.accounts.contains_key(identifier) {
            return Err(AuthError::unknown_account(identifier));
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_count.fetch_add(1, Ordering::SeqCst);
        self.emit(None);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Flaky Store
// =============================================================================

/// A delegating document store with error and latency injection.
///
/// Wraps a [`MemoryStore`] and fails or delays reads on demand, for driving
/// the retry and offline-fallback paths.
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryStore,

    fail_next_gets: Arc<AtomicU32>,
    fail_all_gets: Arc<AtomicBool>,
    fail_enable_network: Arc<AtomicBool>,
    get_latency: Arc<Mutex<Duration>>,

    get_count: Arc<AtomicU64>,
    set_count: Arc<AtomicU64>,
}

impl FlakyStore {
    /// Creates a healthy store.
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_next_gets: Arc::new(AtomicU32::new(0)),
            fail_all_gets: Arc::new(AtomicBool::new(false)),
            fail_enable_network: Arc::new(AtomicBool::new(false)),
            get_latency: Arc::new(Mutex::new(Duration::ZERO)),
            get_count: Arc::new(AtomicU64::new(0)),
            set_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the wrapped in-memory store for direct seeding.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Fails the next `n` reads with an unavailable error.
    pub fn fail_next_gets(&self, n: u32) {
        self.fail_next_gets.store(n, Ordering::SeqCst);
    }

    /// Fails every read until cleared.
    pub fn fail_all_gets(&self, enabled: bool) {
        self.fail_all_gets.store(enabled, Ordering::SeqCst);
    }

    /// Makes reconnect attempts fail.
    pub fn fail_enable_network(&self, enabled: bool) {
        self.fail_enable_network.store(enabled, Ordering::SeqCst);
    }

    /// Delays every read by the given duration.
    pub fn set_get_latency(&self, latency: Duration) {
        *self.get_latency.lock() = latency;
    }

    /// Returns how many reads were attempted.
    pub fn get_count(&self) -> u64 {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Returns how many writes were attempted.
    pub fn set_count(&self) -> u64 {
        self.set_count.load(Ordering::SeqCst)
    }

    fn next_get_failure(&self) -> Option<StoreError> {
        if self.fail_all_gets.load(Ordering::SeqCst) {
            return Some(StoreError::unavailable("simulated outage"));
        }

        let remaining = self.fail_next_gets.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_gets.store(remaining - 1, Ordering::SeqCst);
            return Some(StoreError::unavailable("simulated outage"));
        }

        None
    }
}

impl Default for FlakyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.get_count.fetch_add(1, Ordering::SeqCst);

        let latency = *self.get_latency.lock();
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.next_get_failure() {
            return Err(error);
        }

        self.inner.get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, doc: Document, merge: bool) -> StoreResult<()> {
        self.set_count.fetch_add(1, Ordering::SeqCst);
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

    async fn enable_network(&self) -> StoreResult<()> {
        if self.fail_enable_network.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("simulated reconnect failure"));
        }
        self.inner.enable_network().await
    }

    async fn disable_network(&self) -> StoreResult<()> {
        self.inner.disable_network().await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

// =============================================================================
// Tests
// =============================================================================
