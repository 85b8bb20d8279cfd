// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Document store abstraction.
//!
//! The external document database is an opaque collaborator offering
//! get/set/update/delete/query operations over schemaless documents, with
//! eventual-consistency semantics and a network switch for offline periods.
//! This module defines the trait the rest of the system programs against;
//! [`MemoryStore`](crate::memory_store::MemoryStore) is the in-process
//! implementation used by tests and development.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// A schemaless document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Query
// =============================================================================

/// Comparison operator for a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Field equals value.
    Eq,
}

/// A single field filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    /// Field name.
    pub field: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Value to compare against.
    pub value: serde_json::Value,
}

impl Filter {
    /// Creates an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Checks whether a document matches this filter.
    pub fn matches(&self, doc: &Document) -> bool {
        match self.op {
            FilterOp::Eq => doc.get(&self.field) == Some(&self.value),
        }
    }
}

/// Ordering clause for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field to order by.
    pub field: String,
    /// Whether to sort descending.
    pub descending: bool,
}

/// A query over a collection: equality filters, optional ordering, optional
/// limit. This is the full surface the system needs from the external store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// Filters, all of which must match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    /// Optional ordering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    /// Optional result limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Query {
    /// Creates an empty query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter.
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    /// Orders results ascending by a field.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            descending: false,
        });
        self
    }

    /// Orders results descending by a field.
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            descending: true,
        });
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks whether a document matches all filters.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

// =============================================================================
// DocumentStore Trait
// =============================================================================

/// Trait for document store implementations.
///
/// Implementations must be `Send + Sync`; every consumer holds the store as
/// `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document by id. Returns `Ok(None)` when the document does
    /// not exist; errors are reserved for operational failures.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Writes a document under the given id.
    ///
    /// With `merge` set, fields are merged into any existing document;
    /// otherwise the document is replaced wholesale.
    async fn set(&self, collection: &str, id: &str, doc: Document, merge: bool) -> StoreResult<()>;

    /// Updates fields of an existing document. Fails with
    /// [`StoreError::NotFound`](crate::error::StoreError::NotFound) when the
    /// document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()>;

    /// Deletes a document. Deleting a missing document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Appends a document under a generated id and returns the id.
    async fn add(&self, collection: &str, doc: Document) -> StoreResult<String>;

    /// Runs a query against a collection, returning `(id, document)` pairs.
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<(String, Document)>>;

    /// Re-enables remote access after an offline period.
    async fn enable_network(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Disables remote access, queueing writes locally where supported.
    async fn disable_network(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Returns the store name for identification.
    fn name(&self) -> &str {
        "document_store"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: &[(&str, serde_json::Value)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_filter_eq() {
        let d = doc(&[("role", "manager".into()), ("status", "active".into())]);

        assert!(Filter::eq("role", "manager").matches(&d));
        assert!(!Filter::eq("role", "admin").matches(&d));
        assert!(!Filter::eq("missing", "x").matches(&d));
    }

    #[test]
    fn test_query_matches_all_filters() {
        let d = doc(&[("role", "manager".into()), ("status", "active".into())]);

        let q = Query::new()
            .filter_eq("role", "manager")
            .filter_eq("status", "active");
        assert!(q.matches(&d));

        let q = Query::new()
            .filter_eq("role", "manager")
            .filter_eq("status", "pending");
        assert!(!q.matches(&d));
    }

    #[test]
    fn test_query_builder() {
        let q = Query::new()
            .filter_eq("role", "admin")
            .order_by_desc("created_at")
            .limit(10);

        assert_eq!(q.filters.len(), 1);
        assert!(q.order_by.as_ref().unwrap().descending);
        assert_eq!(q.limit, Some(10));
    }
}
