// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging errors.

use thiserror::Error;

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors raised by audit loggers.
///
/// Audit failures never affect the outcome of the operation being audited;
/// callers log them at warn level and move on.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store rejected the write.
    #[error("Failed to write audit entry: {message}")]
    Storage {
        /// Failure description.
        message: String,
    },

    /// An entry could not be encoded or decoded.
    #[error("Failed to serialize audit entry: {message}")]
    Serialization {
        /// Failure description.
        message: String,
    },

    /// This logger does not support the requested operation.
    #[error("Audit operation not supported: {operation}")]
    Unsupported {
        /// The unsupported operation.
        operation: String,
    },
}

impl AuditError {
    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}
