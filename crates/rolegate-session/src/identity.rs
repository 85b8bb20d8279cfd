// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity provider abstraction.
//!
//! The external identity provider is an opaque collaborator: it verifies
//! credentials, owns the long-lived identity session, and pushes
//! identity-change events whenever the current principal changes. The
//! session manager consumes those events; it never polls.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use rolegate_core::{AuthError, Principal};

/// Capacity of the identity event channel. Events are tiny and consumers
/// drain them promptly; lag is logged and tolerated.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Stream of identity-change events.
///
/// Each event carries the new current principal, or `None` when the provider
/// reports that no principal is signed in.
pub type IdentityEvents = broadcast::Receiver<Option<Principal>>;

// =============================================================================
// IdentityProvider Trait
// =============================================================================

/// Trait for identity provider implementations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribes to identity-change events.
    ///
    /// Implementations replay the current identity to the new subscription
    /// where they can, so late subscribers converge without waiting for the
    /// next real change. Duplicate events must be tolerated by consumers.
    fn subscribe(&self) -> IdentityEvents;

    /// Verifies credentials and establishes an identity session.
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError>;

    /// Creates a new identity record and signs it in.
    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError>;

    /// Sends a password reset to the account's contact address.
    async fn send_password_reset(&self, identifier: &str) -> Result<(), AuthError>;

    /// Terminates the current identity session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Returns the provider name for identification.
    fn name(&self) -> &str {
        "identity_provider"
    }
}

// =============================================================================
// Memory Identity Provider
// =============================================================================

struct StoredAccount {
    secret: String,
    principal: Principal,
    disabled: bool,
}

/// In-process identity provider for development and tests.
///
/// Accounts are held in memory with plain secret comparison; this is demo
/// plumbing, not a credential store. A real deployment plugs its identity
/// service in behind [`IdentityProvider`].
#[derive(Clone)]
pub struct MemoryIdentityProvider {
    accounts: Arc<DashMap<String, StoredAccount>>,
    current: Arc<RwLock<Option<Principal>>>,
    events: broadcast::Sender<Option<Principal>>,
}

impl MemoryIdentityProvider {
    /// Creates a new provider with no accounts and no signed-in principal.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accounts: Arc::new(DashMap::new()),
            current: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Registers an account without signing it in. Returns the principal.
    pub fn register(&self, identifier: impl Into<String>, secret: impl Into<String>) -> Principal {
        let identifier = identifier.into();
        let principal = Principal::new(Uuid::now_v7().to_string()).with_email(&identifier);

        self.accounts.insert(
            identifier,
            StoredAccount {
                secret: secret.into(),
                principal: principal.clone(),
                disabled: false,
            },
        );

        principal
    }

    /// Seeds an account, builder style.
    pub fn with_account(self, identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        self.register(identifier, secret);
        self
    }

    /// Disables an account so sign-in fails with an account-disabled error.
    pub fn disable_account(&self, identifier: &str) {
        if let Some(mut account) = self.accounts.get_mut(identifier) {
            account.disabled = true;
        }
    }

    /// Returns the currently signed-in principal, if any.
    pub fn current(&self) -> Option<Principal> {
        self.current.read().clone()
    }

    fn emit(&self, event: Option<Principal>) {
        // Send only fails when no subscriber exists, which is fine.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn subscribe(&self) -> IdentityEvents {
        let rx = self.events.subscribe();
        // Replay the current identity so the new subscriber converges.
        self.emit(self.current());
        rx
    }

    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
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

        *self.current.write() = Some(principal.clone());
        self.emit(Some(principal.clone()));

        Ok(principal)
    }

    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Principal, AuthError> {
        if self.accounts.contains_key(identifier) {
            return Err(AuthError::account_exists(identifier));
        }

        let principal = self.register(identifier, secret);

        *self.current.write() = Some(principal.clone());
        self.emit(Some(principal.clone()));

        Ok(principal)
    }

    async fn send_password_reset(&self, identifier: &str) -> Result<(), AuthError> {
        if !self.accounts.contains_key(identifier) {
            return Err(AuthError::unknown_account(identifier));
        }

        tracing::info!(identifier = %identifier, "Password reset dispatched");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.write() = None;
        self.emit(None);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
