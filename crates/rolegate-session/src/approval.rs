// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Elevated-role approval policies.
//!
//! Signing up as an admin or manager requires approval. The policy is
//! pluggable; the shipped [`CodeListApproval`] checks submitted evidence
//! against per-role accepted-code documents and is explicitly a
//! low-assurance placeholder (shared codes, no expiry, no per-user binding),
//! not a security mechanism. Deployments with real requirements implement
//! [`ElevatedRoleApprovalPolicy`] against their own approval workflow.
//!
//! Store failures during approval fail closed: an elevation that cannot be
//! verified is an elevation denied.

use std::sync::Arc;

use async_trait::async_trait;

use rolegate_core::store::DocumentStore;
use rolegate_core::{Role, StoreResult};

// =============================================================================
// Approval Policy Trait
// =============================================================================

/// Trait for elevated-role approval policies.
#[async_trait]
pub trait ElevatedRoleApprovalPolicy: Send + Sync {
    /// Decides whether a sign-up for `role` with the given evidence is
    /// approved. Only called for elevated roles.
    async fn approve(&self, role: Role, evidence: Option<&str>) -> StoreResult<bool>;

    /// Returns the policy name for identification.
    fn name(&self) -> &str {
        "approval_policy"
    }
}

// =============================================================================
// Deny Elevated
// =============================================================================

/// Policy that rejects every elevated sign-up.
///
/// The safe default: self-service registration only ever yields employees,
/// and elevation happens through the directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyElevated;

impl DenyElevated {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ElevatedRoleApprovalPolicy for DenyElevated {
    async fn approve(&self, _role: Role, _evidence: Option<&str>) -> StoreResult<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "deny_elevated"
    }
}

// =============================================================================
// Allow Elevated
// =============================================================================

/// Policy that approves every elevated sign-up. For tests and local
/// development only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowElevated;

impl AllowElevated {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ElevatedRoleApprovalPolicy for AllowElevated {
    async fn approve(&self, _role: Role, _evidence: Option<&str>) -> StoreResult<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "allow_elevated"
    }
}

// =============================================================================
// Code List Approval
// =============================================================================

/// Approval by membership in a per-role accepted-code list.
///
/// Each role has one document in the configured collection, keyed by the
/// role name, with a `codes` array of accepted strings. Evidence is approved
/// by simple membership.
#[derive(Clone)]
pub struct CodeListApproval {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CodeListApproval {
    /// Creates a policy reading from the given collection.
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Seeds the demo code documents for roles that have none yet.
    ///
    /// The seeded codes are placeholders for local development; operators
    /// replace them before exposing sign-up.
    pub async fn seed_defaults(&self) -> StoreResult<()> {
        for (role, code) in [(Role::Admin, "666666"), (Role::Manager, "789012")] {
            if self.store.get(&self.collection, role.as_str()).await?.is_none() {
                let mut doc = rolegate_core::Document::new();
                doc.insert("codes".to_string(), serde_json::json!([code]));
                self.store
                    .set(&self.collection, role.as_str(), doc, false)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ElevatedRoleApprovalPolicy for CodeListApproval {
    async fn approve(&self, role: Role, evidence: Option<&str>) -> StoreResult<bool> {
        let Some(evidence) = evidence else {
            return Ok(false);
        };

        let Some(doc) = self.store.get(&self.collection, role.as_str()).await? else {
            return Ok(false);
        };

        let accepted = doc
            .get("codes")
            .and_then(|v| v.as_array())
            .map(|codes| codes.iter().any(|c| c.as_str() == Some(evidence)))
            .unwrap_or(false);

        Ok(accepted)
    }

    fn name(&self) -> &str {
        "code_list"
    }
}

impl std::fmt::Debug for CodeListApproval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeListApproval")
            .field("collection", &self.collection)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
