// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server-side authorization policy.
//!
//! Route gating is cosmetic: a client can bypass it trivially. Every
//! operation that mutates the profile store therefore validates the caller's
//! role against this policy first, independent of whatever the UI chose to
//! render.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use rolegate_core::{AuthError, Role};

use crate::session::Session;

// =============================================================================
// Permission
// =============================================================================

/// Permissions for directory and audit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read user profiles other than one's own.
    UserRead,
    /// Create, update and delete users.
    UserManage,
    /// Change a user's role.
    RoleManage,
    /// Read the audit trail.
    AuditRead,
}

impl Permission {
    /// Returns the permission name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserRead => "user:read",
            Permission::UserManage => "user:manage",
            Permission::RoleManage => "role:manage",
            Permission::AuditRead => "audit:read",
        }
    }

    /// Returns all available permissions.
    pub fn all() -> &'static [Permission] {
        &[
            Permission::UserRead,
            Permission::UserManage,
            Permission::RoleManage,
            Permission::AuditRead,
        ]
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Access Policy
// =============================================================================

/// Role-to-permission mapping consulted before privileged operations.
///
/// Created once at startup and shared across all consumers.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl AccessPolicy {
    /// Creates the standard policy: admins hold every permission, managers
    /// may read users and the audit trail, employees hold none.
    pub fn new() -> Self {
        Self::builder()
            .grant(Role::Admin, Permission::all().to_vec())
            .grant(
                Role::Manager,
                vec![Permission::UserRead, Permission::AuditRead],
            )
            .build()
    }

    /// Creates a policy builder.
    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder::default()
    }

    /// Returns `true` if the role holds the permission.
    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .map(|perms| perms.contains(&permission))
            .unwrap_or(false)
    }

    /// Returns the permissions granted to a role, sorted by name.
    pub fn permissions_for(&self, role: Role) -> Vec<Permission> {
        let mut perms: Vec<Permission> = self
            .grants
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        perms.sort_by_key(|p| p.as_str());
        perms
    }

    /// Validates that the session's actor holds the permission.
    ///
    /// Sessions that are not authenticated are denied outright; an
    /// initializing session is treated as neither authenticated nor
    /// unauthenticated, and is denied like any other non-authenticated
    /// caller.
    pub fn authorize(&self, session: &Session, permission: Permission) -> Result<(), AuthError> {
        if !session.is_authenticated() {
            return Err(AuthError::forbidden("authentication required"));
        }

        let Some(role) = session.role() else {
            return Err(AuthError::forbidden("session has no resolved role"));
        };

        if self.allows(role, permission) {
            Ok(())
        } else {
            Err(AuthError::forbidden(format!(
                "role '{}' lacks permission '{}'",
                role, permission
            )))
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Access Policy Builder
// =============================================================================

/// Builder for constructing access policies.
#[derive(Debug, Default)]
pub struct AccessPolicyBuilder {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl AccessPolicyBuilder {
    /// Grants permissions to a role.
    pub fn grant(mut self, role: Role, permissions: Vec<Permission>) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    /// Builds the policy.
    pub fn build(self) -> AccessPolicy {
        AccessPolicy {
            grants: self.grants,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_core::Principal;

    fn session_with_role(role: Role) -> Session {
        Session::authenticated(&Principal::new("u1"), role, 1)
    }

    #[test]
    fn test_standard_grants() {
        let policy = AccessPolicy::new();

        assert!(policy.allows(Role::Admin, Permission::UserManage));
        assert!(policy.allows(Role::Admin, Permission::RoleManage));
        assert!(policy.allows(Role::Manager, Permission::UserRead));
        assert!(!policy.allows(Role::Manager, Permission::UserManage));
        assert!(!policy.allows(Role::Employee, Permission::UserRead));
    }

    #[test]
    fn test_authorize_by_session() {
        let policy = AccessPolicy::new();

        assert!(policy
            .authorize(&session_with_role(Role::Admin), Permission::UserManage)
            .is_ok());

        let err = policy
            .authorize(&session_with_role(Role::Employee), Permission::UserManage)
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[test]
    fn test_unauthenticated_sessions_denied() {
        let policy = AccessPolicy::new();

        assert!(policy
            .authorize(&Session::unauthenticated(1), Permission::UserRead)
            .is_err());
        assert!(policy
            .authorize(&Session::initializing(), Permission::UserRead)
            .is_err());
    }

    #[test]
    fn test_custom_policy() {
        let policy = AccessPolicy::builder()
            .grant(Role::Employee, vec![Permission::AuditRead])
            .build();

        assert!(policy.allows(Role::Employee, Permission::AuditRead));
        assert!(!policy.allows(Role::Admin, Permission::AuditRead));
    }

    #[test]
    fn test_permissions_for_is_sorted() {
        let policy = AccessPolicy::new();
        let perms = policy.permissions_for(Role::Admin);

        assert_eq!(perms.len(), Permission::all().len());
        let names: Vec<&str> = perms.iter().map(|p| p.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
