// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for rolegate.
//!
//! This module defines the error type system used across the workspace:
//!
//! - Provides clear, descriptive error messages
//! - Distinguishes between retryable and non-retryable errors
//! - Separates errors that cross the session boundary (`AuthError`,
//!   `ValidationError`) from those absorbed with a safe default
//!   (`StoreError`, `AuditError`)
//! - Supports structured logging
//!
//! # Error Hierarchy
//!
//! ```text
//! RolegateError (root)
//! ├── AuthError        - Identity provider and authorization failures
//! ├── ValidationError  - Malformed input, rejected before any remote call
//! ├── StoreError       - Document store operations
//! └── AuditError       - Audit log writes/queries (always swallowed)
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::audit::AuditError;

// =============================================================================
// RolegateError - Root Error Type
// =============================================================================

/// The root error type for rolegate.
///
/// All errors in the workspace can be converted to this type. Note that only
/// the `Auth` and `Validation` variants ever cross the session boundary to a
/// caller; store and audit failures are absorbed with safe defaults.
#[derive(Debug, Error)]
pub enum RolegateError {
    /// Authentication or authorization error.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Document store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Audit logging error.
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),
}

impl RolegateError {
    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            RolegateError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            RolegateError::Auth(_) => "auth",
            RolegateError::Validation(_) => "validation",
            RolegateError::Store(_) => "store",
            RolegateError::Audit(_) => "audit",
        }
    }

    /// Returns a user-friendly error message.
    ///
    /// This message is suitable for display to end users and avoids
    /// exposing internal implementation details.
    pub fn user_message(&self) -> String {
        match self {
            RolegateError::Auth(e) => e.user_message(),
            RolegateError::Validation(e) => format!("입력 검증 실패: {}", e),
            RolegateError::Store(_) => "서비스를 일시적으로 사용할 수 없습니다".to_string(),
            RolegateError::Audit(_) => "감사 로그 기록에 실패했습니다".to_string(),
        }
    }
}

// =============================================================================
// AuthError
// =============================================================================

/// Authentication and authorization errors.
///
/// These are surfaced synchronously to the caller of the session-mutating
/// operations and are never retried automatically.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials did not match an account.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials {
        /// Provider-supplied message.
        message: String,
    },

    /// The account exists but has been disabled.
    #[error("Account disabled: {identifier}")]
    AccountDisabled {
        /// The account identifier.
        identifier: String,
    },

    /// An account with this identifier already exists.
    #[error("Account already exists: {identifier}")]
    AccountExists {
        /// The account identifier.
        identifier: String,
    },

    /// No account with this identifier is known.
    #[error("Unknown account: {identifier}")]
    UnknownAccount {
        /// The account identifier.
        identifier: String,
    },

    /// Another sign-in or sign-up is already in flight on this manager.
    #[error("Another authentication operation is already in progress")]
    OperationInFlight,

    /// The caller's role does not permit the operation.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Reason for the denial.
        message: String,
    },

    /// Elevated-role sign-up was not approved.
    #[error("Elevated role '{role}' was not approved")]
    ApprovalRejected {
        /// The requested role.
        role: String,
    },

    /// Other provider-side failure.
    #[error("Identity provider error: {message}")]
    Provider {
        /// Provider-supplied message.
        message: String,
    },
}

impl AuthError {
    /// Creates an invalid-credentials error.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Creates an account-disabled error.
    pub fn account_disabled(identifier: impl Into<String>) -> Self {
        Self::AccountDisabled {
            identifier: identifier.into(),
        }
    }

    /// Creates an account-exists error.
    pub fn account_exists(identifier: impl Into<String>) -> Self {
        Self::AccountExists {
            identifier: identifier.into(),
        }
    }

    /// Creates an unknown-account error.
    pub fn unknown_account(identifier: impl Into<String>) -> Self {
        Self::UnknownAccount {
            identifier: identifier.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates an approval-rejected error.
    pub fn approval_rejected(role: impl Into<String>) -> Self {
        Self::ApprovalRejected { role: role.into() }
    }

    /// Creates a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Returns `true` if this error should be recorded in the audit trail.
    pub fn should_audit(&self) -> bool {
        matches!(
            self,
            AuthError::Forbidden { .. } | AuthError::ApprovalRejected { .. }
        )
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials { .. } => {
                "이메일 또는 비밀번호가 올바르지 않습니다".to_string()
            }
            AuthError::AccountDisabled { .. } => "비활성화된 계정입니다".to_string(),
            AuthError::AccountExists { .. } => "이미 등록된 계정입니다".to_string(),
            AuthError::UnknownAccount { .. } => "등록되지 않은 계정입니다".to_string(),
            AuthError::OperationInFlight => {
                "이미 처리 중인 요청이 있습니다. 잠시 후 다시 시도해주세요".to_string()
            }
            AuthError::Forbidden { .. } => "접근 권한이 없습니다".to_string(),
            AuthError::ApprovalRejected { .. } => "역할 승인에 실패했습니다".to_string(),
            AuthError::Provider { message } => message.clone(),
        }
    }
}

// =============================================================================
// ValidationError
// =============================================================================

/// Malformed-input errors, rejected before any remote call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A role string did not name one of the three known roles.
    #[error("Invalid role '{value}': expected admin, manager or employee")]
    InvalidRole {
        /// The rejected value.
        value: String,
    },

    /// A required field was empty or missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The field name.
        field: String,
    },

    /// A secret did not meet the minimum length.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },

    /// Two fields that must match did not.
    #[error("Field '{field}' does not match its confirmation")]
    FieldMismatch {
        /// The field name.
        field: String,
    },
}

impl ValidationError {
    /// Creates an invalid-role error.
    pub fn invalid_role(value: impl Into<String>) -> Self {
        Self::InvalidRole {
            value: value.into(),
        }
    }

    /// Creates a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a password-too-short error.
    pub fn password_too_short(min: usize) -> Self {
        Self::PasswordTooShort { min }
    }

    /// Creates a field-mismatch error.
    pub fn field_mismatch(field: impl Into<String>) -> Self {
        Self::FieldMismatch {
            field: field.into(),
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Document store errors.
///
/// Transient variants are retried by role resolution (bounded, with linear
/// backoff) and then silently downgraded to the default role; they never
/// cross the session boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Failure description.
        message: String,
    },

    /// The operation did not complete within the allotted time.
    #[error("Store operation timed out after {duration:?}")]
    Timeout {
        /// The elapsed timeout.
        duration: Duration,
    },

    /// Remote access is currently disabled.
    #[error("Store network access is disabled")]
    Offline,

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Failure description.
        message: String,
    },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// Not-found is a definitive answer, not a failure, and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. } | StoreError::Offline
        )
    }

    /// Returns `true` if this error indicates a connectivity problem.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. } | StoreError::Offline
        )
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_retryability() {
        assert!(StoreError::unavailable("down").is_retryable());
        assert!(StoreError::timeout(Duration::from_secs(5)).is_retryable());
        assert!(StoreError::Offline.is_retryable());
        assert!(!StoreError::not_found("users", "u1").is_retryable());
        assert!(!StoreError::serialization("bad json").is_retryable());
    }

    #[test]
    fn test_root_error_retryability() {
        let retryable: RolegateError = StoreError::unavailable("down").into();
        assert!(retryable.is_retryable());

        let auth: RolegateError = AuthError::invalid_credentials("nope").into();
        assert!(!auth.is_retryable());
    }

    #[test]
    fn test_error_types() {
        let e: RolegateError = ValidationError::invalid_role("root").into();
        assert_eq!(e.error_type(), "validation");

        let e: RolegateError = AuthError::OperationInFlight.into();
        assert_eq!(e.error_type(), "auth");
    }

    #[test]
    fn test_should_audit() {
        assert!(AuthError::forbidden("no access").should_audit());
        assert!(AuthError::approval_rejected("admin").should_audit());
        assert!(!AuthError::invalid_credentials("bad").should_audit());
        assert!(!AuthError::OperationInFlight.should_audit());
    }

    #[test]
    fn test_user_messages_do_not_leak_internals() {
        let e = AuthError::invalid_credentials("pg: connection refused at 10.0.0.3");
        assert!(!e.user_message().contains("10.0.0.3"));
    }
}
