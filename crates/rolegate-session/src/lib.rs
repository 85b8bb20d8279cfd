// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rolegate-session
//!
//! Session lifecycle, role resolution and route gating for the rolegate
//! access platform.
//!
//! The two cooperating cores:
//!
//! - [`SessionManager`]: owns the authentication lifecycle — subscribes to
//!   the identity provider's auth-state stream, resolves a role for the
//!   authenticated principal, and publishes read-only [`Session`] snapshots.
//! - [`RouteAccessGuard`]: consumes those snapshots to decide, per protected
//!   view, whether to render, hold, or redirect based on a required-role
//!   declaration.
//!
//! Around them: the [`IdentityProvider`] and approval-policy abstractions,
//! the server-side [`AccessPolicy`], and the [`UserDirectory`] that applies
//! it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rolegate_core::MemoryStore;
//! use rolegate_session::{
//!     MemoryIdentityProvider, RouteAccessGuard, SessionManager,
//! };
//!
//! let provider = Arc::new(MemoryIdentityProvider::new());
//! let manager = SessionManager::builder()
//!     .identity(provider)
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! manager.initialize();
//!
//! let session = manager.sign_in("a@example.com", "secret").await?;
//! let guard = RouteAccessGuard::new(manager.config().entry_points.clone());
//! let decision = guard.check(&session);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod config;
pub mod identity;
pub mod manager;
pub mod resolve;
pub mod session;

// =============================================================================
// Gating Modules
// =============================================================================

pub mod approval;
pub mod authz;
pub mod directory;
pub mod guard;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use config::{CollectionsConfig, EntryPoints, SessionConfig};
pub use identity::{IdentityEvents, IdentityProvider, MemoryIdentityProvider};
pub use manager::{SessionManager, SessionManagerBuilder, SignUpRequest};
pub use resolve::{ResolutionOutcome, ResolvedRole, RoleResolver};
pub use session::{Session, SessionStatus};

pub use approval::{AllowElevated, CodeListApproval, DenyElevated, ElevatedRoleApprovalPolicy};
pub use authz::{AccessPolicy, AccessPolicyBuilder, Permission};
pub use directory::{UserDirectory, UserUpdate};
pub use guard::{GuardDecision, RouteAccessGuard};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
