// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User directory.
//!
//! CRUD over the profile collection, with the access policy enforced before
//! every call and mutations recorded in the audit trail. Unlike role
//! resolution, directory operations surface store failures to the caller:
//! an administrator needs to know that a listing is stale or a write was
//! lost, where a session consumer must not.

use std::sync::Arc;

use chrono::Utc;

use rolegate_core::store::Query;
use rolegate_core::{
    AccountStatus, AuditLog, AuditLogger, AuditTarget, Document, DocumentStore, Role,
    RolegateError, StoreError, UserProfile, ValidationError,
};

use crate::authz::{AccessPolicy, Permission};
use crate::config::SessionConfig;
use crate::identity::IdentityProvider;
use crate::session::Session;

// =============================================================================
// User Update
// =============================================================================

/// Fields an administrator may change on a profile.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New role, if changing.
    pub role: Option<Role>,
    /// New account status, if changing.
    pub status: Option<AccountStatus>,
    /// New display name, if changing.
    pub name: Option<String>,
}

impl UserUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.status.is_none() && self.name.is_none()
    }
}

// =============================================================================
// User Directory
// =============================================================================

/// Administrative access to the profile collection.
pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    audit: Arc<dyn AuditLogger>,
    policy: AccessPolicy,
    users_collection: String,
}

impl UserDirectory {
    /// Creates a directory over the configured users collection.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        audit: Arc<dyn AuditLogger>,
        policy: AccessPolicy,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            identity,
            audit,
            policy,
            users_collection: config.collections.users.clone(),
        }
    }

    /// Lists every profile, newest first.
    pub async fn list_users(&self, actor: &Session) -> Result<Vec<UserProfile>, RolegateError> {
        self.authorize(actor, Permission::UserRead, AuditTarget::collection(&self.users_collection))?;

        let rows = self
            .store
            .query(
                &self.users_collection,
                Query::new().order_by_desc("created_at"),
            )
            .await?;

        Ok(rows
            .iter()
            .map(|(id, doc)| UserProfile::from_document(id, doc))
            .collect())
    }

    /// Lists profiles holding a role, newest first.
    pub async fn users_by_role(
        &self,
        actor: &Session,
        role: Role,
    ) -> Result<Vec<UserProfile>, RolegateError> {
        self.authorize(actor, Permission::UserRead, AuditTarget::collection(&self.users_collection))?;

        let rows = self
            .store
            .query(
                &self.users_collection,
                Query::new()
                    .filter_eq("role", role.as_str())
                    .order_by_desc("created_at"),
            )
            .await?;

        Ok(rows
            .iter()
            .map(|(id, doc)| UserProfile::from_document(id, doc))
            .collect())
    }

    /// Fetches one profile. Actors may always read their own profile;
    /// reading others requires the user-read permission.
    pub async fn get_user(
        &self,
        actor: &Session,
        user_id: &str,
    ) -> Result<Option<UserProfile>, RolegateError> {
        let is_self = actor.principal_id.as_deref() == Some(user_id);
        if !is_self {
            self.authorize(actor, Permission::UserRead, AuditTarget::user(user_id))?;
        }

        let doc = self.store.get(&self.users_collection, user_id).await?;
        Ok(doc.map(|doc| UserProfile::from_document(user_id, &doc)))
    }

    /// Creates an identity record and its profile.
    ///
    /// Requires user-manage; assigning an elevated role additionally
    /// requires role-manage.
    pub async fn create_user(
        &self,
        actor: &Session,
        identifier: &str,
        secret: &str,
        role: Role,
        status: AccountStatus,
    ) -> Result<UserProfile, RolegateError> {
        self.authorize(actor, Permission::UserManage, AuditTarget::user(identifier))?;
        if role.is_elevated() {
            self.authorize(actor, Permission::RoleManage, AuditTarget::user(identifier))?;
        }

        if identifier.trim().is_empty() {
            return Err(ValidationError::missing_field("identifier").into());
        }

        let principal = self.identity.create_account(identifier, secret).await?;

        let profile = UserProfile::new(&principal.id, role)
            .with_email(identifier)
            .with_status(status);
        self.store
            .set(
                &self.users_collection,
                &principal.id,
                profile.to_document(),
                false,
            )
            .await?;

        self.spawn_audit(AuditLog::user_created(
            self.actor_label(actor),
            identifier,
            role,
        ));

        Ok(profile)
    }

    /// Applies an update to a profile and returns the updated profile.
    pub async fn update_user(
        &self,
        actor: &Session,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<UserProfile, RolegateError> {
        self.authorize(actor, Permission::UserManage, AuditTarget::user(user_id))?;
        if update.role.is_some() {
            self.authorize(actor, Permission::RoleManage, AuditTarget::user(user_id))?;
        }

        if update.is_empty() {
            return Err(ValidationError::missing_field("update").into());
        }

        let existing = self
            .store
            .get(&self.users_collection, user_id)
            .await?
            .ok_or_else(|| StoreError::not_found(&self.users_collection, user_id))?;
        let previous = UserProfile::from_document(user_id, &existing);

        let mut fields = Document::new();
        if let Some(role) = update.role {
            fields.insert("role".to_string(), serde_json::json!(role.as_str()));
        }
        if let Some(status) = update.status {
            fields.insert("status".to_string(), serde_json::json!(status.as_str()));
        }
        if let Some(ref name) = update.name {
            fields.insert("name".to_string(), serde_json::json!(name));
        }
        fields.insert(
            "updated_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );

        self.store
            .update(&self.users_collection, user_id, fields)
            .await?;

        match update.role {
            Some(new_role) if new_role != previous.role => {
                self.spawn_audit(AuditLog::role_change(
                    self.actor_label(actor),
                    user_id,
                    Some(previous.role),
                    new_role,
                ));
            }
            _ => {
                self.spawn_audit(AuditLog::user_updated(self.actor_label(actor), user_id));
            }
        }

        let doc = self
            .store
            .get(&self.users_collection, user_id)
            .await?
            .ok_or_else(|| StoreError::not_found(&self.users_collection, user_id))?;
        Ok(UserProfile::from_document(user_id, &doc))
    }

    /// Deletes a profile.
    ///
    /// Only the profile document is removed; deleting the identity record
    /// itself requires provider-side tooling outside this system's reach.
    pub async fn delete_user(&self, actor: &Session, user_id: &str) -> Result<(), RolegateError> {
        self.authorize(actor, Permission::UserManage, AuditTarget::user(user_id))?;

        self.store.delete(&self.users_collection, user_id).await?;

        self.spawn_audit(AuditLog::user_deleted(self.actor_label(actor), user_id));

        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Runs the policy check, recording denied attempts in the audit trail.
    fn authorize(
        &self,
        actor: &Session,
        permission: Permission,
        target: AuditTarget,
    ) -> Result<(), RolegateError> {
        match self.policy.authorize(actor, permission) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.spawn_audit(AuditLog::access_denied(
                    self.actor_label(actor),
                    target,
                    e.to_string(),
                ));
                Err(e.into())
            }
        }
    }

    fn actor_label(&self, actor: &Session) -> String {
        actor
            .actor_label()
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn spawn_audit(&self, entry: AuditLog) {
        let logger = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = logger.log(entry).await {
                tracing::warn!(error = %e, "Failed to record audit entry");
            }
        });
    }
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("users_collection", &self.users_collection)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_core::{InMemoryAuditLogger, MemoryStore, Principal};

    use crate::identity::MemoryIdentityProvider;

    struct Fixture {
        directory: UserDirectory,
        store: MemoryStore,
        audit: InMemoryAuditLogger,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let audit = InMemoryAuditLogger::new();

        let directory = UserDirectory::new(
            Arc::new(store.clone()),
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(audit.clone()),
            AccessPolicy::new(),
            &SessionConfig::default(),
        );

        Fixture {
            directory,
            store,
            audit,
        }
    }

    fn admin() -> Session {
        Session::authenticated(&Principal::new("admin-1").with_email("admin@example.com"), Role::Admin, 1)
    }

    fn manager() -> Session {
        Session::authenticated(&Principal::new("mgr-1"), Role::Manager, 1)
    }

    fn employee() -> Session {
        Session::authenticated(&Principal::new("emp-1"), Role::Employee, 1)
    }

    async fn seed_user(store: &MemoryStore, id: &str, role: Role) {
        store
            .set("users", id, UserProfile::new(id, role).to_document(), false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let f = fixture();

        f.directory
            .create_user(
                &admin(),
                "new@example.com",
                "longenough",
                Role::Employee,
                AccountStatus::Active,
            )
            .await
            .unwrap();

        let users = f.directory.list_users(&admin()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email.as_deref(), Some("new@example.com"));
    }

    #[tokio::test]
    async fn test_employee_cannot_list() {
        let f = fixture();

        let err = f.directory.list_users(&employee()).await.unwrap_err();
        assert!(matches!(err, RolegateError::Auth(_)));

        // The denial landed in the audit trail.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(f.audit.failed_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_manager_reads_but_cannot_mutate() {
        let f = fixture();
        seed_user(&f.store, "u1", Role::Employee).await;

        assert_eq!(f.directory.list_users(&manager()).await.unwrap().len(), 1);

        let err = f
            .directory
            .update_user(&manager(), "u1", UserUpdate::new().status(AccountStatus::Inactive))
            .await
            .unwrap_err();
        assert!(matches!(err, RolegateError::Auth(_)));
    }

    #[tokio::test]
    async fn test_users_by_role() {
        let f = fixture();
        seed_user(&f.store, "u1", Role::Manager).await;
        seed_user(&f.store, "u2", Role::Employee).await;
        seed_user(&f.store, "u3", Role::Manager).await;

        let managers = f.directory.users_by_role(&admin(), Role::Manager).await.unwrap();
        assert_eq!(managers.len(), 2);
        assert!(managers.iter().all(|p| p.role == Role::Manager));
    }

    #[tokio::test]
    async fn test_self_read_allowed_without_permission() {
        let f = fixture();
        seed_user(&f.store, "emp-1", Role::Employee).await;

        let profile = f.directory.get_user(&employee(), "emp-1").await.unwrap();
        assert!(profile.is_some());

        // Reading someone else is denied.
        assert!(f.directory.get_user(&employee(), "other").await.is_err());
    }

    #[tokio::test]
    async fn test_role_change_requires_role_manage_and_audits() {
        let f = fixture();
        seed_user(&f.store, "u1", Role::Employee).await;

        let updated = f
            .directory
            .update_user(&admin(), "u1", UserUpdate::new().role(Role::Manager))
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Manager);
        assert!(updated.updated_at.is_some());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        use rolegate_core::AuditAction;
        assert_eq!(f.audit.entries_for_action(AuditAction::RoleChange).len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let f = fixture();

        let err = f
            .directory
            .update_user(&admin(), "ghost", UserUpdate::new().name("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, RolegateError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let f = fixture();
        seed_user(&f.store, "u1", Role::Employee).await;

        let err = f
            .directory
            .update_user(&admin(), "u1", UserUpdate::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RolegateError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let f = fixture();
        seed_user(&f.store, "u1", Role::Employee).await;

        f.directory.delete_user(&admin(), "u1").await.unwrap();

        assert!(f.store.get("users", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_elevated_create_requires_role_manage() {
        let f = fixture();

        // Admins hold role:manage, so creating a manager works.
        f.directory
            .create_user(
                &admin(),
                "mgr@example.com",
                "longenough",
                Role::Manager,
                AccountStatus::Active,
            )
            .await
            .unwrap();

        // A policy without role:manage cannot create elevated users.
        let store = MemoryStore::new();
        let limited = UserDirectory::new(
            Arc::new(store),
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(InMemoryAuditLogger::new()),
            AccessPolicy::builder()
                .grant(Role::Admin, vec![Permission::UserRead, Permission::UserManage])
                .build(),
            &SessionConfig::default(),
        );

        let err = limited
            .create_user(
                &admin(),
                "boss@example.com",
                "longenough",
                Role::Admin,
                AccountStatus::Active,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RolegateError::Auth(_)));
    }
}
