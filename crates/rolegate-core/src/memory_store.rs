// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory document store for testing and development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::{Document, DocumentStore, Query};

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory document store.
///
/// Supports the full [`DocumentStore`] surface including equality queries,
/// ordering and limits, plus an offline switch that makes every operation
/// fail with [`StoreError::Offline`] until the network is re-enabled.
///
/// # Thread Safety
///
/// Collections are `DashMap`s; the store can be shared freely across tasks.
/// Cloning is shallow — clones observe the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, DashMap<String, Document>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates a new, empty store with network access enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if network access is currently disabled.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Returns the number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Returns `true` if a collection is empty or absent.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Removes every document from every collection.
    pub fn clear(&self) {
        self.collections.clear();
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.is_offline() {
            Err(StoreError::Offline)
        } else {
            Ok(())
        }
    }

    fn collection(&self, name: &str) -> dashmap::mapref::one::RefMut<'_, String, DashMap<String, Document>> {
        self.collections.entry(name.to_string()).or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check_online()?;
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.get(id).map(|d| d.clone())))
    }

    async fn set(&self, collection: &str, id: &str, doc: Document, merge: bool) -> StoreResult<()> {
        self.check_online()?;
        let coll = self.collection(collection);

        if merge {
            let mut entry = coll.entry(id.to_string()).or_default();
            for (key, value) in doc {
                entry.insert(key, value);
            }
        } else {
            coll.insert(id.to_string(), doc);
        }

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        self.check_online()?;
        let coll = self.collection(collection);

        let result = match coll.get_mut(id) {
            Some(mut entry) => {
                for (key, value) in fields {
                    entry.insert(key, value);
                }
                Ok(())
            }
            None => Err(StoreError::not_found(collection, id)),
        };
        result
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.check_online()?;
        if let Some(coll) = self.collections.get(collection) {
            coll.remove(id);
        }
        Ok(())
    }

    async fn add(&self, collection: &str, doc: Document) -> StoreResult<String> {
        self.check_online()?;
        let id = Uuid::now_v7().to_string();
        self.collection(collection).insert(id.clone(), doc);
        Ok(id)
    }

    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<(String, Document)>> {
        self.check_online()?;

        let mut results: Vec<(String, Document)> = match self.collections.get(collection) {
            Some(coll) => coll
                .iter()
                .filter(|entry| query.matches(entry.value()))
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
            None => Vec::new(),
        };

        if let Some(ref order) = query.order_by {
            results.sort_by(|(_, a), (_, b)| {
                let ord = compare_values(a.get(&order.field), b.get(&order.field));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        } else {
            // Deterministic output for unordered queries.
            results.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn enable_network(&self) -> StoreResult<()> {
        self.offline.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn disable_network(&self) -> StoreResult<()> {
        self.offline.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Compares two optional JSON values for ordering.
///
/// Missing fields sort before present ones; mixed types compare by type tag.
/// Timestamps stored as RFC 3339 strings order chronologically under the
/// string comparison.
fn compare_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> std::cmp::Ordering {
    use serde_json::Value;
    use std::cmp::Ordering;

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(v: &serde_json::Value) -> u8 {
    use serde_json::Value;
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
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

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();

        store
            .set("users", "u1", doc(&[("role", "admin".into())]), false)
            .await
            .unwrap();

        let fetched = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(fetched.get("role").and_then(|v| v.as_str()), Some("admin"));

        assert!(store.get("users", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replace_vs_merge() {
        let store = MemoryStore::new();

        store
            .set(
                "users",
                "u1",
                doc(&[("role", "admin".into()), ("status", "active".into())]),
                false,
            )
            .await
            .unwrap();

        // Merge keeps existing fields.
        store
            .set("users", "u1", doc(&[("role", "manager".into())]), true)
            .await
            .unwrap();
        let fetched = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(fetched.get("role").and_then(|v| v.as_str()), Some("manager"));
        assert_eq!(fetched.get("status").and_then(|v| v.as_str()), Some("active"));

        // Replace drops them.
        store
            .set("users", "u1", doc(&[("role", "employee".into())]), false)
            .await
            .unwrap();
        let fetched = store.get("users", "u1").await.unwrap().unwrap();
        assert!(fetched.get("status").is_none());
    }

    #[tokio::test]
    async fn test_update_requires_existing() {
        let store = MemoryStore::new();

        let err = store
            .update("users", "ghost", doc(&[("role", "admin".into())]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        store
            .set("users", "u1", doc(&[("role", "employee".into())]), false)
            .await
            .unwrap();
        store
            .update("users", "u1", doc(&[("role", "manager".into())]))
            .await
            .unwrap();

        let fetched = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(fetched.get("role").and_then(|v| v.as_str()), Some("manager"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();

        store
            .set("users", "u1", Document::new(), false)
            .await
            .unwrap();
        store.delete("users", "u1").await.unwrap();
        store.delete("users", "u1").await.unwrap();

        assert!(store.get("users", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_generates_ids() {
        let store = MemoryStore::new();

        let id1 = store.add("audit_logs", Document::new()).await.unwrap();
        let id2 = store.add("audit_logs", Document::new()).await.unwrap();

        assert_ne!(id1, id2);
        assert_eq!(store.len("audit_logs"), 2);
    }

    #[tokio::test]
    async fn test_query_filter_order_limit() {
        let store = MemoryStore::new();

        for (id, role, ts) in [
            ("u1", "manager", "2025-01-01T00:00:00Z"),
            ("u2", "employee", "2025-01-02T00:00:00Z"),
            ("u3", "manager", "2025-01-03T00:00:00Z"),
        ] {
            store
                .set(
                    "users",
                    id,
                    doc(&[("role", role.into()), ("created_at", ts.into())]),
                    false,
                )
                .await
                .unwrap();
        }

        let managers = store
            .query(
                "users",
                Query::new()
                    .filter_eq("role", "manager")
                    .order_by_desc("created_at"),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = managers.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["u3", "u1"]);

        let limited = store
            .query("users", Query::new().order_by("created_at").limit(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].0, "u1");
    }

    #[tokio::test]
    async fn test_offline_switch() {
        let store = MemoryStore::new();

        store
            .set("users", "u1", Document::new(), false)
            .await
            .unwrap();

        store.disable_network().await.unwrap();
        assert!(store.is_offline());
        assert!(matches!(
            store.get("users", "u1").await.unwrap_err(),
            StoreError::Offline
        ));

        store.enable_network().await.unwrap();
        assert!(store.get("users", "u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = MemoryStore::new();
        let clone = store.clone();

        store
            .set("users", "u1", Document::new(), false)
            .await
            .unwrap();

        assert_eq!(clone.len("users"), 1);
    }
}
