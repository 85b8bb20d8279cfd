// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory audit logger for testing and development.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog};
use super::AuditLogger;

// =============================================================================
// In-Memory Audit Logger
// =============================================================================

/// In-memory audit logger.
///
/// Stores all audit entries in memory, supporting both logging and querying.
/// Primarily intended for tests, where the helper accessors make asserting
/// on the recorded trail straightforward.
///
/// # Thread Safety
///
/// Entries are stored in a `RwLock`-protected vector; clones share the same
/// underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLogger {
    logs: Arc<RwLock<Vec<AuditLog>>>,
}

impl InMemoryAuditLogger {
    /// Creates a new in-memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all logged entries.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.logs.read().clone()
    }

    /// Returns entries matching a predicate.
    pub fn entries_where<F>(&self, predicate: F) -> Vec<AuditLog>
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs
            .read()
            .iter()
            .filter(|l| predicate(l))
            .cloned()
            .collect()
    }

    /// Returns entries for a specific actor.
    pub fn entries_for_actor(&self, actor: &str) -> Vec<AuditLog> {
        self.entries_where(|l| l.actor.as_deref() == Some(actor))
    }

    /// Returns entries for a specific action.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.entries_where(|l| l.action == action)
    }

    /// Returns security-sensitive entries.
    pub fn security_events(&self) -> Vec<AuditLog> {
        self.entries_where(|l| l.action.is_security_sensitive())
    }

    /// Returns failed or denied entries.
    pub fn failed_entries(&self) -> Vec<AuditLog> {
        self.entries_where(|l| l.result.is_failure() || l.result.is_denied())
    }

    /// Checks if any entry matches the predicate.
    pub fn has_entry<F>(&self, predicate: F) -> bool
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().any(predicate)
    }

    /// Counts entries matching a predicate.
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().filter(|l| predicate(l)).count()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.logs.write().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        self.logs.write().push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let logs = self.logs.read();
        let mut results: Vec<AuditLog> = logs.iter().filter(|log| filter.matches(log)).cloned().collect();

        if filter.descending {
            results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        } else {
            results.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        }

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_query(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::ActionResult;
    use crate::audit::AuditTarget;
    use crate::types::Role;

    #[tokio::test]
    async fn test_memory_logger_basic() {
        let logger = InMemoryAuditLogger::new();
        assert!(logger.is_empty());

        logger.log(AuditLog::sign_in("admin@example.com")).await.unwrap();

        assert_eq!(logger.len(), 1);
        assert!(!logger.is_empty());
    }

    #[tokio::test]
    async fn test_memory_logger_query() {
        let logger = InMemoryAuditLogger::new();

        logger.log(AuditLog::sign_in("admin@example.com")).await.unwrap();
        logger.log(AuditLog::sign_out("admin@example.com")).await.unwrap();
        logger
            .log(AuditLog::sign_up("new@example.com", Role::Employee))
            .await
            .unwrap();

        let sign_ins = logger
            .query(AuditFilter::new().action(AuditAction::SignIn))
            .await
            .unwrap();
        assert_eq!(sign_ins.len(), 1);

        let admin_logs = logger
            .query(AuditFilter::new().actor("admin@example.com"))
            .await
            .unwrap();
        assert_eq!(admin_logs.len(), 2);

        let limited = logger.query(AuditFilter::new().limit(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_logger_helpers() {
        let logger = InMemoryAuditLogger::new();

        logger.log(AuditLog::sign_in("a@example.com")).await.unwrap();
        logger
            .log(AuditLog::access_denied(
                "b@example.com",
                AuditTarget::collection("users"),
                "missing permission",
            ))
            .await
            .unwrap();

        assert_eq!(logger.entries_for_action(AuditAction::SignIn).len(), 1);
        assert_eq!(logger.failed_entries().len(), 1);
        assert_eq!(logger.security_events().len(), 2);
        assert!(logger.has_entry(|l| l.result == ActionResult::Denied));
        assert_eq!(logger.count_where(|l| l.actor.is_some()), 2);
    }

    #[tokio::test]
    async fn test_memory_logger_clone_shares_entries() {
        let logger1 = InMemoryAuditLogger::new();
        let logger2 = logger1.clone();

        logger1.log(AuditLog::sign_in("a@example.com")).await.unwrap();

        assert_eq!(logger2.len(), 1);

        logger2.clear();
        assert!(logger1.is_empty());
    }
}
