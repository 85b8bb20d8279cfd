// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session subsystem configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use rolegate_core::retry::RetryConfig;
use rolegate_core::Role;

// =============================================================================
// SessionConfig
// =============================================================================

/// Configuration for the session manager and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Document store collection names.
    pub collections: CollectionsConfig,
    /// Retry policy for profile lookups during role resolution.
    pub retry: RetryConfig,
    /// Timeout applied to each individual resolution attempt.
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Duration,
    /// Minimum accepted secret length for sign-up.
    pub min_secret_len: usize,
    /// Entry-point routes used by the route access guard.
    pub entry_points: EntryPoints,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            collections: CollectionsConfig::default(),
            retry: RetryConfig::default(),
            attempt_timeout: Duration::from_secs(5),
            min_secret_len: 8,
            entry_points: EntryPoints::default(),
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the entry points.
    pub fn with_entry_points(mut self, entry_points: EntryPoints) -> Self {
        self.entry_points = entry_points;
        self
    }
}

// =============================================================================
// CollectionsConfig
// =============================================================================

/// Names of the document store collections the subsystem touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    /// User profile collection, keyed by principal id.
    pub users: String,
    /// Append-only audit log collection.
    pub audit_logs: String,
    /// Per-role accepted-code documents for elevated sign-up.
    pub verification_codes: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            audit_logs: "audit_logs".to_string(),
            verification_codes: "verification_codes".to_string(),
        }
    }
}

// =============================================================================
// EntryPoints
// =============================================================================

/// The default landing route for each role, plus the sign-in route.
///
/// Used by the route access guard as redirect targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPoints {
    /// Sign-in route, the target for unauthenticated visitors.
    pub sign_in: String,
    /// Admin landing route.
    pub admin_home: String,
    /// Manager landing route.
    pub manager_home: String,
    /// Employee landing route.
    pub employee_home: String,
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self {
            sign_in: "/auth".to_string(),
            admin_home: "/dashboard".to_string(),
            manager_home: "/manager-dashboard".to_string(),
            employee_home: "/user-dashboard".to_string(),
        }
    }
}

impl EntryPoints {
    /// Returns the landing route for a role.
    pub fn home_for(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin_home,
            Role::Manager => &self.manager_home,
            Role::Employee => &self.employee_home,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
