// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core audit log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

// =============================================================================
// Audit Log Entry
// =============================================================================

/// A single audit log entry.
///
/// Entries capture who did what to which resource, with enough structure to
/// query by actor, action, severity and time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique log entry id.
    pub id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the event.
    pub severity: AuditSeverity,

    /// Identifier of the actor (principal id or contact email), if known.
    pub actor: Option<String>,

    /// The action that was performed.
    pub action: AuditAction,

    /// The resource that was affected.
    pub target: AuditTarget,

    /// Additional details about the action.
    pub details: serde_json::Value,

    /// The result of the action.
    pub result: ActionResult,
}

impl AuditLog {
    /// Creates a new audit log entry.
    pub fn new(action: AuditAction, target: AuditTarget, result: ActionResult) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            severity: action.default_severity(),
            actor: None,
            action,
            target,
            details: serde_json::Value::Null,
            result,
        }
    }

    /// Sets the actor.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Sets the details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    // =========================================================================
    // Factory methods for common actions
    // =========================================================================

    /// Creates an audit log for a completed sign-in.
    pub fn sign_in(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        Self::new(
            AuditAction::SignIn,
            AuditTarget::user(&actor),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({
            "message": format!("User {} signed in", actor),
        }))
        .with_actor(actor)
    }

    /// Creates an audit log for a sign-out.
    pub fn sign_out(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        Self::new(
            AuditAction::SignOut,
            AuditTarget::user(&actor),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({
            "message": format!("User {} signed out", actor),
        }))
        .with_actor(actor)
    }

    /// Creates an audit log for a new registration.
    pub fn sign_up(actor: impl Into<String>, role: Role) -> Self {
        let actor = actor.into();
        Self::new(
            AuditAction::SignUp,
            AuditTarget::user(&actor),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({
            "message": format!("New user {} registered with role {}", actor, role),
            "role": role.as_str(),
        }))
        .with_actor(actor)
    }

    /// Creates an audit log for a password reset request.
    pub fn password_reset(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        Self::new(
            AuditAction::PasswordReset,
            AuditTarget::user(&actor),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({
            "message": format!("Password reset requested for {}", actor),
        }))
        .with_actor(actor)
    }

    /// Creates an audit log for a role change.
    pub fn role_change(
        actor: impl Into<String>,
        target_user: impl Into<String>,
        old_role: Option<Role>,
        new_role: Role,
    ) -> Self {
        let target_user = target_user.into();
        Self::new(
            AuditAction::RoleChange,
            AuditTarget::user(&target_user),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({
            "old_role": old_role.map(|r| r.as_str()),
            "new_role": new_role.as_str(),
        }))
        .with_actor(actor)
    }

    /// Creates an audit log for a user created through the directory.
    pub fn user_created(actor: impl Into<String>, target_user: impl Into<String>, role: Role) -> Self {
        let target_user = target_user.into();
        Self::new(
            AuditAction::UserCreate,
            AuditTarget::user(&target_user),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({ "role": role.as_str() }))
        .with_actor(actor)
    }

    /// Creates an audit log for a user updated through the directory.
    pub fn user_updated(actor: impl Into<String>, target_user: impl Into<String>) -> Self {
        let target_user = target_user.into();
        Self::new(
            AuditAction::UserUpdate,
            AuditTarget::user(&target_user),
            ActionResult::Success,
        )
        .with_actor(actor)
    }

    /// Creates an audit log for a user deleted through the directory.
    pub fn user_deleted(actor: impl Into<String>, target_user: impl Into<String>) -> Self {
        let target_user = target_user.into();
        Self::new(
            AuditAction::UserDelete,
            AuditTarget::user(&target_user),
            ActionResult::Success,
        )
        .with_actor(actor)
    }

    /// Creates an audit log for a denied operation.
    pub fn access_denied(
        actor: impl Into<String>,
        target: AuditTarget,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(AuditAction::AccessDenied, target, ActionResult::Denied)
            .with_details(serde_json::json!({ "reason": reason.into() }))
            .with_severity(AuditSeverity::Warning)
            .with_actor(actor)
    }
}

// =============================================================================
// Audit Severity
// =============================================================================

/// Severity level for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    /// Detailed information for debugging.
    Debug,
    /// Normal operations.
    #[default]
    Info,
    /// Normal but significant events.
    Notice,
    /// Potentially harmful situations.
    Warning,
    /// Error events.
    Error,
    /// Critical conditions.
    Critical,
}

impl AuditSeverity {
    /// Returns the severity level as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Debug => "debug",
            AuditSeverity::Info => "info",
            AuditSeverity::Notice => "notice",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Error => "error",
            AuditSeverity::Critical => "critical",
        }
    }

    /// Returns the numeric level (higher = more severe).
    pub fn level(&self) -> u8 {
        match self {
            AuditSeverity::Debug => 0,
            AuditSeverity::Info => 1,
            AuditSeverity::Notice => 2,
            AuditSeverity::Warning => 3,
            AuditSeverity::Error => 4,
            AuditSeverity::Critical => 5,
        }
    }
}

impl std::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Audit Action
// =============================================================================

/// Types of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// User signed in.
    SignIn,
    /// User signed out.
    SignOut,
    /// New user registered.
    SignUp,
    /// Password reset requested.
    PasswordReset,
    /// A user's role was changed.
    RoleChange,
    /// User created through the directory.
    UserCreate,
    /// User updated through the directory.
    UserUpdate,
    /// User deleted through the directory.
    UserDelete,
    /// An operation was denied by the access policy.
    AccessDenied,
    /// Custom action for extensions.
    Custom,
}

impl AuditAction {
    /// Returns the action name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SignIn => "sign_in",
            AuditAction::SignOut => "sign_out",
            AuditAction::SignUp => "sign_up",
            AuditAction::PasswordReset => "password_reset",
            AuditAction::RoleChange => "role_change",
            AuditAction::UserCreate => "user_create",
            AuditAction::UserUpdate => "user_update",
            AuditAction::UserDelete => "user_delete",
            AuditAction::AccessDenied => "access_denied",
            AuditAction::Custom => "custom",
        }
    }

    /// Returns `true` if this is a security-sensitive action.
    pub fn is_security_sensitive(&self) -> bool {
        matches!(
            self,
            AuditAction::SignIn
                | AuditAction::SignUp
                | AuditAction::PasswordReset
                | AuditAction::RoleChange
                | AuditAction::UserCreate
                | AuditAction::UserDelete
                | AuditAction::AccessDenied
        )
    }

    /// Returns the default severity for this action.
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            AuditAction::SignIn | AuditAction::SignOut => AuditSeverity::Info,
            AuditAction::AccessDenied => AuditSeverity::Warning,
            AuditAction::SignUp
            | AuditAction::PasswordReset
            | AuditAction::RoleChange
            | AuditAction::UserCreate
            | AuditAction::UserUpdate
            | AuditAction::UserDelete => AuditSeverity::Notice,
            AuditAction::Custom => AuditSeverity::Info,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Audit Target
// =============================================================================

/// The resource that was affected by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTarget {
    /// Resource type.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
}

impl AuditTarget {
    /// Creates a new audit target.
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Creates a user target.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new("user", user_id)
    }

    /// Creates a collection target.
    pub fn collection(name: impl Into<String>) -> Self {
        Self::new("collection", name)
    }

    /// Creates a system target.
    pub fn system() -> Self {
        Self::new("system", "rolegate")
    }

    /// Returns the full resource path.
    pub fn full_path(&self) -> String {
        format!("{}:{}", self.resource_type, self.resource_id)
    }
}

// =============================================================================
// Action Result
// =============================================================================

/// The result of an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResult {
    /// Action completed successfully.
    Success,
    /// Action failed.
    Failure {
        /// Reason for failure.
        reason: String,
    },
    /// Action was denied by the access policy.
    Denied,
}

impl ActionResult {
    /// Creates a failure result.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the action was successful.
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success)
    }

    /// Returns `true` if the action was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, ActionResult::Denied)
    }

    /// Returns `true` if the action failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionResult::Failure { .. })
    }
}

impl Default for ActionResult {
    fn default() -> Self {
        Self::Success
    }
}

// =============================================================================
// Audit Filter
// =============================================================================

/// Filter for querying audit logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Filter by actor.
    pub actor: Option<String>,
    /// Filter by action type.
    pub action: Option<AuditAction>,
    /// Filter by minimum severity.
    pub min_severity: Option<AuditSeverity>,
    /// Keep only successful entries.
    pub success_only: bool,
    /// Start time (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// End time (exclusive).
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Sort order (true = descending by timestamp).
    #[serde(default)]
    pub descending: bool,
}

impl AuditFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by actor.
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Filters by action.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Filters by minimum severity.
    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Keeps only successful entries.
    pub fn success_only(mut self) -> Self {
        self.success_only = true;
        self
    }

    /// Filters by time range.
    pub fn time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Sets the limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets descending order.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Checks if a log entry matches this filter.
    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(ref actor) = self.actor {
            if log.actor.as_ref() != Some(actor) {
                return false;
            }
        }

        if let Some(action) = self.action {
            if log.action != action {
                return false;
            }
        }

        if let Some(min_severity) = self.min_severity {
            if log.severity.level() < min_severity.level() {
                return false;
            }
        }

        if self.success_only && !log.result.is_success() {
            return false;
        }

        if let Some(from) = self.from {
            if log.timestamp < from {
                return false;
            }
        }

        if let Some(to) = self.to {
            if log.timestamp >= to {
                return false;
            }
        }

        true
    }
}

// =============================================================================
// Tests
// =============================================================================
