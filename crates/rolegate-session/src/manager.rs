// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle management.
//!
//! [`SessionManager`] is the single source of truth for who is currently
//! using the system and with what authority. It owns the identity-change
//! subscription, resolves roles through the profile store, and publishes
//! read-only [`Session`] snapshots through a watch channel.
//!
//! # Concurrency
//!
//! The session slot is a `tokio::sync::watch` channel: every publication
//! replaces the whole snapshot and the last writer wins, so consumers can
//! never observe a torn state. A user-initiated `sign_in` races the ambient
//! subscription's own event for the same principal by design; both paths
//! publish complete snapshots. Overlapping `sign_in`/`sign_up` calls on the
//! same manager are rejected rather than interleaved. Identity events are
//! buffered by the subscription channel, so a slow profile lookup delays
//! processing but never delivery.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use rolegate_core::{
    AuditLog, AuditLogger, AuthError, ConnectivityGate, DocumentStore, NoOpAuditLogger, Principal,
    Role, RolegateError, UserProfile, ValidationError,
};

use crate::approval::{DenyElevated, ElevatedRoleApprovalPolicy};
use crate::config::SessionConfig;
use crate::identity::IdentityProvider;
use crate::resolve::RoleResolver;
use crate::session::Session;

// =============================================================================
// Sign-Up Request
// =============================================================================

/// Input to [`SessionManager::sign_up`].
///
/// The requested role is carried as a string and validated before any remote
/// call is made; only the three known roles are accepted.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    /// Account identifier (contact email).
    pub identifier: String,
    /// Account secret.
    pub secret: String,
    /// Optional secret confirmation; must match the secret when present.
    pub secret_confirmation: Option<String>,
    /// Requested role name.
    pub requested_role: String,
    /// Approval evidence for elevated roles (e.g. a verification code).
    pub approval_evidence: Option<String>,
}

impl SignUpRequest {
    /// Creates a request for the given identifier, secret and role.
    pub fn new(
        identifier: impl Into<String>,
        secret: impl Into<String>,
        requested_role: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            secret_confirmation: None,
            requested_role: requested_role.into(),
            approval_evidence: None,
        }
    }

    /// Sets the secret confirmation.
    pub fn with_confirmation(mut self, confirmation: impl Into<String>) -> Self {
        self.secret_confirmation = Some(confirmation.into());
        self
    }

    /// Sets the approval evidence.
    pub fn with_approval_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.approval_evidence = Some(evidence.into());
        self
    }
}

// =============================================================================
// Session Manager
// =============================================================================

/// Owner of the authentication lifecycle.
///
/// Constructed explicitly via [`SessionManager::builder`] and passed down to
/// consumers; one manager (and therefore one identity subscription) exists
/// per process.
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    audit: Arc<dyn AuditLogger>,
    approval: Arc<dyn ElevatedRoleApprovalPolicy>,
    connectivity: ConnectivityGate,
    config: SessionConfig,
    resolver: RoleResolver,
    sessions: watch::Sender<Session>,
    epoch: AtomicU64,
    initialized: AtomicBool,
    listener: parking_lot::Mutex<Option<JoinHandle<()>>>,
    op_gate: tokio::sync::Mutex<()>,
    // Handed to the listener task so it never keeps the manager alive.
    me: Weak<SessionManager>,
}

impl SessionManager {
    /// Creates a manager builder.
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::new()
    }

    /// Establishes the identity-change subscription.
    ///
    /// Idempotent: repeated calls while a subscription is active are a
    /// no-op. Until the first identity event arrives, the published session
    /// stays in the initializing state.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session manager already initialized");
            return;
        }

        let mut events = self.identity.subscribe();
        let manager = self.me.clone();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(manager) = manager.upgrade() else { break };
                        manager.handle_identity_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Identity event stream lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Identity event stream closed");
                        break;
                    }
                }
            }
        });

        *self.listener.lock() = Some(handle);
        tracing::info!(provider = %self.identity.name(), "Session manager initialized");
    }

    /// Tears down the identity subscription, allowing a later
    /// re-initialization. Primarily for tests and controlled shutdown.
    pub fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// Returns the current session snapshot.
    pub fn current(&self) -> Session {
        self.sessions.borrow().clone()
    }

    /// Subscribes to session replacements.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.sessions.subscribe()
    }

    /// Returns the connectivity gate.
    pub fn connectivity(&self) -> &ConnectivityGate {
        &self.connectivity
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // =========================================================================
    // Session-mutating operations
    // =========================================================================

    /// Verifies credentials with the identity provider and establishes an
    /// authenticated session.
    ///
    /// On provider failure the error is surfaced and the ambient session is
    /// left untouched. The audit entry is written best-effort and never
    /// blocks or fails the sign-in.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Session, RolegateError> {
        let _in_flight = self
            .op_gate
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        if identifier.trim().is_empty() {
            return Err(ValidationError::missing_field("identifier").into());
        }
        if secret.is_empty() {
            return Err(ValidationError::missing_field("secret").into());
        }

        let principal = self.identity.sign_in(identifier, secret).await?;
        tracing::info!(principal_id = %principal.id, "Sign-in succeeded");

        self.spawn_audit(AuditLog::sign_in(identifier));

        let resolved = self.resolver.resolve(&principal).await;
        let session =
            self.publish_with(|epoch| Session::authenticated(&principal, resolved.role, epoch));
        self.record_login(&principal);

        Ok(session)
    }

    /// Creates a new identity record with the requested role.
    ///
    /// Validation (role name, secret length, confirmation match) happens
    /// before any remote call. Elevated roles additionally require approval.
    /// A failed profile write does not fail the sign-up: the identity record
    /// exists, and the next identity event re-attempts role resolution.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Session, RolegateError> {
        let _in_flight = self
            .op_gate
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        if request.identifier.trim().is_empty() {
            return Err(ValidationError::missing_field("identifier").into());
        }
        if request.secret.len() < self.config.min_secret_len {
            return Err(ValidationError::password_too_short(self.config.min_secret_len).into());
        }
        if let Some(ref confirmation) = request.secret_confirmation {
            if confirmation != &request.secret {
                return Err(ValidationError::field_mismatch("secret").into());
            }
        }

        let role = Role::parse_strict(&request.requested_role)?;

        if role.is_elevated() {
            let approved = match self
                .approval
                .approve(role, request.approval_evidence.as_deref())
                .await
            {
                Ok(approved) => approved,
                Err(e) => {
                    // Elevation that cannot be verified is elevation denied.
                    tracing::warn!(error = %e, role = %role, "Approval check failed, rejecting");
                    false
                }
            };

            if !approved {
                return Err(AuthError::approval_rejected(role.as_str()).into());
            }
        }

        let principal = self
            .identity
            .create_account(&request.identifier, &request.secret)
            .await?;
        tracing::info!(principal_id = %principal.id, role = %role, "Account created");

        let profile = UserProfile::new(&principal.id, role)
            .with_email(&request.identifier);
        if let Err(e) = self
            .store
            .set(
                &self.config.collections.users,
                &principal.id,
                profile.to_document(),
                false,
            )
            .await
        {
            tracing::warn!(
                principal_id = %principal.id,
                error = %e,
                "Failed to persist profile for new account; next identity event will re-resolve"
            );
        }

        self.spawn_audit(AuditLog::sign_up(&request.identifier, role));

        Ok(self.publish_with(|epoch| Session::authenticated(&principal, role, epoch)))
    }

    /// Terminates the identity session.
    ///
    /// The audit entry is skipped when no session is active, and the
    /// provider sign-out completes even if the audit write fails.
    pub async fn sign_out(&self) -> Result<(), RolegateError> {
        match self.current().actor_label() {
            Some(actor) => self.spawn_audit(AuditLog::sign_out(actor)),
            None => tracing::debug!("No active session, skipping sign-out audit entry"),
        }

        self.identity.sign_out().await?;
        self.publish_with(Session::unauthenticated);

        Ok(())
    }

    /// Requests a password reset for the account. Does not mutate the
    /// ambient session.
    pub async fn reset_password(&self, identifier: &str) -> Result<(), RolegateError> {
        if identifier.trim().is_empty() {
            return Err(ValidationError::missing_field("identifier").into());
        }

        self.identity.send_password_reset(identifier).await?;
        self.spawn_audit(AuditLog::password_reset(identifier));

        Ok(())
    }

    /// Attempts to re-enable remote store access after an offline period.
    ///
    /// Returns whether the attempt succeeded. Does not by itself change the
    /// session's role; the next identity event re-resolves it.
    pub async fn retry_connection(&self) -> bool {
        match self.store.enable_network().await {
            Ok(()) => {
                self.connectivity.mark_online();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reconnect attempt failed");
                self.connectivity.mark_offline();
                false
            }
        }
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Handles one identity-change event from the subscription.
    async fn handle_identity_event(&self, event: Option<Principal>) {
        match event {
            None => {
                tracing::debug!("Identity event: no principal");
                self.publish_with(Session::unauthenticated);
            }
            Some(principal) => {
                tracing::debug!(principal_id = %principal.id, "Identity event: principal present");

                // Resolution never fails; the session becomes authenticated
                // regardless, falling open to the default role rather than
                // sticking in initializing.
                let resolved = self.resolver.resolve(&principal).await;
                self.publish_with(|epoch| Session::authenticated(&principal, resolved.role, epoch));
                self.record_login(&principal);
            }
        }
    }

    /// Publishes a new session snapshot, replacing the previous one whole.
    fn publish_with(&self, make: impl FnOnce(u64) -> Session) -> Session {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst);
        let session = make(epoch);

        let previous = self.sessions.send_replace(session.clone());
        if !previous.status.can_transition_to(session.status) {
            tracing::error!(
                from = %previous.status,
                to = %session.status,
                "Session status left the state machine"
            );
        }

        session
    }

    /// Dispatches a best-effort audit write that never blocks the caller.
    fn spawn_audit(&self, entry: AuditLog) {
        let logger = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = logger.log(entry).await {
                tracing::warn!(error = %e, "Failed to record audit entry");
            }
        });
    }

    /// Merges a last-login timestamp into the profile, best-effort.
    fn record_login(&self, principal: &Principal) {
        let store = Arc::clone(&self.store);
        let collection = self.config.collections.users.clone();
        let id = principal.id.clone();

        tokio::spawn(async move {
            let mut fields = rolegate_core::Document::new();
            fields.insert(
                "last_login".to_string(),
                serde_json::json!(chrono::Utc::now().to_rfc3339()),
            );

            if let Err(e) = store.set(&collection, &id, fields, true).await {
                tracing::warn!(principal_id = %id, error = %e, "Failed to update last login");
            }
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("provider", &self.identity.name())
            .field("store", &self.store.name())
            .field("status", &self.current().status)
            .finish()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Session Manager Builder
// =============================================================================

/// Builder for constructing a [`SessionManager`].
pub struct SessionManagerBuilder {
    identity: Option<Arc<dyn IdentityProvider>>,
    store: Option<Arc<dyn DocumentStore>>,
    audit: Option<Arc<dyn AuditLogger>>,
    approval: Option<Arc<dyn ElevatedRoleApprovalPolicy>>,
    connectivity: Option<ConnectivityGate>,
    config: SessionConfig,
}

impl SessionManagerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            identity: None,
            store: None,
            audit: None,
            approval: None,
            connectivity: None,
            config: SessionConfig::default(),
        }
    }

    /// Sets the identity provider.
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the document store.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the audit logger. Defaults to the no-op logger.
    pub fn audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sets the elevated-role approval policy. Defaults to denying every
    /// elevated sign-up.
    pub fn approval(mut self, approval: Arc<dyn ElevatedRoleApprovalPolicy>) -> Self {
        self.approval = Some(approval);
        self
    }

    /// Sets the connectivity gate, for sharing one gate across components.
    pub fn connectivity(mut self, gate: ConnectivityGate) -> Self {
        self.connectivity = Some(gate);
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the manager.
    ///
    /// Returns an error when the identity provider or store is missing.
    pub fn build(self) -> Result<Arc<SessionManager>, ValidationError> {
        let identity = self
            .identity
            .ok_or_else(|| ValidationError::missing_field("identity"))?;
        let store = self
            .store
            .ok_or_else(|| ValidationError::missing_field("store"))?;

        let audit = self.audit.unwrap_or_else(|| Arc::new(NoOpAuditLogger));
        let approval = self.approval.unwrap_or_else(|| Arc::new(DenyElevated));
        let connectivity = self.connectivity.unwrap_or_default();
        let resolver = RoleResolver::new(Arc::clone(&store), connectivity.clone(), &self.config);

        let (sessions, _) = watch::channel(Session::initializing());

        Ok(Arc::new_cyclic(|me| SessionManager {
            identity,
            store,
            audit,
            approval,
            connectivity,
            config: self.config,
            resolver,
            sessions,
            epoch: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            listener: parking_lot::Mutex::new(None),
            op_gate: tokio::sync::Mutex::new(()),
            me: me.clone(),
        }))
    }
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
