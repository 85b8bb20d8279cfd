// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rolegate-core
//!
//! Core abstractions and shared types for the rolegate access platform.
//!
//! This crate provides the foundational types, traits, and utilities used
//! across all rolegate components:
//!
//! - **Types**: `Role`, `AccountStatus`, `Principal`, `UserProfile`
//! - **Error**: Unified error hierarchy with a fixed propagation policy
//! - **Store**: Document store abstraction plus an in-memory implementation
//! - **Retry**: Bounded retry strategies for transient store failures
//! - **Audit**: Append-only security audit logging
//! - **Connectivity**: Observable online/offline gate
//!
//! ## Example
//!
//! ```rust,ignore
//! use rolegate_core::{MemoryStore, Role, UserProfile};
//! use rolegate_core::store::DocumentStore;
//!
//! let store = MemoryStore::new();
//! let profile = UserProfile::new("u1", Role::Manager);
//! store.set("users", "u1", profile.to_document(), false).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod types;

// =============================================================================
// Store Modules
// =============================================================================

pub mod memory_store;
pub mod retry;
pub mod store;

// =============================================================================
// Observability Modules
// =============================================================================

pub mod audit;
pub mod connectivity;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{AuthError, RolegateError, StoreError, StoreResult, ValidationError};
pub use types::{AccountStatus, Principal, Role, UserProfile};

// Re-export store types
pub use memory_store::MemoryStore;
pub use store::{Document, DocumentStore, Filter, FilterOp, OrderBy, Query};

// Re-export retry types
pub use retry::{LinearBackoff, NoRetry, RetryConfig, RetryDecision, RetryStrategy};

// Re-export audit types
pub use audit::{
    ActionResult, AuditAction, AuditError, AuditFilter, AuditLog, AuditLogger, AuditSeverity,
    AuditTarget, InMemoryAuditLogger, NoOpAuditLogger, StoreAuditLogger,
};

// Re-export connectivity types
pub use connectivity::{ConnectivityGate, ConnectivityState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
