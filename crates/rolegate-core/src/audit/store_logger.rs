// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logger backed by the external document store.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog};
use super::AuditLogger;
use crate::store::{Document, DocumentStore, Query};

// =============================================================================
// Store Audit Logger
// =============================================================================

/// Audit logger that appends entries to an append-only document collection.
///
/// Each entry becomes one document under a generated id. Queries read the
/// collection back and filter in memory, since the store's query surface is
/// limited to equality filters.
#[derive(Clone)]
pub struct StoreAuditLogger {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl StoreAuditLogger {
    /// Creates a logger appending to the given collection.
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Returns the target collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn to_document(entry: &AuditLog) -> AuditResult<Document> {
        match serde_json::to_value(entry) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(AuditError::serialization("entry did not encode to an object")),
            Err(e) => Err(AuditError::serialization(e.to_string())),
        }
    }

    fn from_document(doc: &Document) -> Option<AuditLog> {
        serde_json::from_value(serde_json::Value::Object(doc.clone())).ok()
    }
}

#[async_trait]
impl AuditLogger for StoreAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let doc = Self::to_document(&entry)?;

        self.store
            .add(&self.collection, doc)
            .await
            .map(|_| ())
            .map_err(|e| AuditError::storage(e.to_string()))
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let rows = self
            .store
            .query(&self.collection, Query::new())
            .await
            .map_err(|e| AuditError::storage(e.to_string()))?;

        let mut results: Vec<AuditLog> = rows
            .iter()
            .filter_map(|(_, doc)| Self::from_document(doc))
            .filter(|log| filter.matches(log))
            .collect();

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
        "store"
    }

    fn supports_query(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for StoreAuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAuditLogger")
            .field("collection", &self.collection)
            .field("store", &self.store.name())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
