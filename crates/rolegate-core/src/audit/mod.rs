// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging for security and compliance.
//!
//! Every session-mutating operation and every directory mutation appends an
//! audit entry. Writes are always best-effort: a failed audit write is logged
//! at warn level and never affects the outcome of the primary operation.
//!
//! # Components
//!
//! - [`AuditLogger`]: Core trait for audit logger implementations
//! - [`AuditLog`]: Structured audit log entry
//! - [`InMemoryAuditLogger`]: In-memory logger for tests and development
//! - [`StoreAuditLogger`]: Appends entries to a document-store collection
//!
//! # Example
//!
//! ```rust,ignore
//! use rolegate_core::audit::{AuditLogger, AuditLog, InMemoryAuditLogger};
//!
//! let logger = InMemoryAuditLogger::new();
//! logger.log(AuditLog::sign_in("admin@example.com")).await?;
//! ```

mod error;
mod memory_logger;
mod store_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use memory_logger::InMemoryAuditLogger;
pub use store_logger::StoreAuditLogger;
pub use types::{
    ActionResult, AuditAction, AuditFilter, AuditLog, AuditSeverity, AuditTarget,
};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// Trait for audit logger implementations.
///
/// Designed to be async-first and object-safe; consumers hold loggers as
/// `Arc<dyn AuditLogger>`.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Logs an audit entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Queries audit logs with the given filter.
    ///
    /// Not all logger implementations support querying; those that do not
    /// return [`AuditError::Unsupported`].
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Flushes any buffered logs.
    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    /// Returns the logger name for identification.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger supports querying.
    fn supports_query(&self) -> bool {
        false
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// A no-op audit logger that discards all entries.
///
/// Useful when audit logging is disabled or for testing.
#[derive(Debug, Default, Clone)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// Creates a new no-op logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_logger() {
        let logger = NoOpAuditLogger::new();

        let log = AuditLog::sign_in("admin@example.com");

        assert!(logger.log(log).await.is_ok());
        assert!(logger.query(AuditFilter::default()).await.unwrap().is_empty());
        assert!(logger.flush().await.is_ok());
        assert!(!logger.supports_query());
    }
}
