// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types shared across the rolegate components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::store::Document;

// =============================================================================
// Role
// =============================================================================

/// Application roles.
///
/// Exactly three roles exist; no other value is ever observable. The role
/// determines which views a principal may access and which directory
/// operations it may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Team and request management.
    Manager,
    /// Standard access to the user's own data.
    #[default]
    Employee,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    /// Parses a role, rejecting unknown values with a validation error.
    ///
    /// This is the boundary check for externally supplied role strings; it
    /// runs before any remote call is made.
    pub fn parse_strict(s: &str) -> Result<Self, ValidationError> {
        Self::parse(s).ok_or_else(|| ValidationError::invalid_role(s))
    }

    /// Returns all roles.
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Manager, Role::Employee]
    }

    /// Returns `true` if this role requires elevated-signup approval.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Account Status
// =============================================================================

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account is active and may sign in.
    #[default]
    Active,
    /// Account has been deactivated.
    Inactive,
    /// Account is awaiting activation.
    Pending,
}

impl AccountStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Pending => "pending",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "inactive" => Some(AccountStatus::Inactive),
            "pending" => Some(AccountStatus::Pending),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Principal
// =============================================================================

/// The authenticated identity returned by the identity provider.
///
/// A principal carries only what the provider knows: a stable opaque id and
/// optional contact metadata. The application-level role lives in the
/// [`UserProfile`], not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque identifier, stable per account.
    pub id: String,
    /// Contact email, if the provider knows one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Human-readable label, if the provider knows one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Principal {
    /// Creates a new principal with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }

    /// Sets the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

// =============================================================================
// User Profile
// =============================================================================

/// The application-level record keyed by principal id in the document store.
///
/// This is what role resolution reads and what the user directory manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Principal id this profile belongs to.
    pub id: String,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Assigned role.
    #[serde(default)]
    pub role: Role,
    /// Account status.
    #[serde(default)]
    pub status: AccountStatus,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// Last successful sign-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    /// Last modification through the directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Creates a new profile for a principal with the given role.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
            last_login: None,
            updated_at: None,
        }
    }

    /// Creates the default profile synthesized for an unknown principal.
    pub fn default_for(principal: &Principal) -> Self {
        let mut profile = Self::new(&principal.id, Role::default());
        profile.email = principal.email.clone();
        profile.name = principal.display_name.clone();
        profile
    }

    /// Sets the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the account status.
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Converts the profile into a store document.
    ///
    /// The id is the document key and is not duplicated into the fields.
    pub fn to_document(&self) -> Document {
        let mut doc = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Document::new(),
        };
        doc.remove("id");
        doc
    }

    /// Reads a profile back out of a store document.
    ///
    /// Unknown or missing `role`/`status` fields fall back to their defaults
    /// rather than failing, matching how resolution treats partial documents.
    pub fn from_document(id: impl Into<String>, doc: &Document) -> Self {
        let field_str = |name: &str| doc.get(name).and_then(|v| v.as_str());

        let role = field_str("role").and_then(Role::parse).unwrap_or_default();
        let status = field_str("status")
            .and_then(AccountStatus::parse)
            .unwrap_or_default();
        let parse_ts = |name: &str| {
            field_str(name)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        };

        Self {
            id: id.into(),
            email: field_str("email").map(str::to_string),
            name: field_str("name").map(str::to_string),
            role,
            status,
            created_at: parse_ts("created_at").unwrap_or_else(Utc::now),
            last_login: parse_ts("last_login"),
            updated_at: parse_ts("updated_at"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
