//! Domain service for credential storage and user management.
//!
//! Handles user creation, credential validation, self-service updates, and
//! admin-scoped deletion.

use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::auth_users;

/// Errors specific to user management operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("Cannot change the username of the 'admin' user")]
    AdminUsernameImmutable,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Cannot delete the 'admin' user")]
    AdminProtected,

    #[error("User '{0}' does not exist")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for callers (without the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub scopes: String,
}

impl From<auth_users::Model> for User {
    fn from(model: auth_users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            scopes: model.scopes,
        }
    }
}

/// Domain service trait for user management.
///
/// Every operation runs as its own short-lived transaction; failures are
/// surfaced immediately with no internal retries.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a new user with a hashed password and normalized scope set.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::AlreadyExists`] if the username is taken.
    async fn create_user(
        &self,
        username: &str,
        password: &str,
        scopes: &[String],
    ) -> Result<User, UserError>;

    /// Validates credentials, returning the user on success.
    ///
    /// Returns `Ok(None)` both when the user does not exist and when the
    /// password is wrong; callers cannot distinguish the two.
    async fn validate_user(&self, username: &str, password: &str)
    -> Result<Option<User>, UserError>;

    /// Re-authenticates and applies any subset of username/password/scope
    /// changes; absent fields are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] if re-authentication fails,
    /// [`UserError::AdminUsernameImmutable`] on an attempt to rename the
    /// 'admin' user, and [`UserError::UsernameTaken`] on a collision.
    async fn update_user(
        &self,
        username: &str,
        password: &str,
        new_username: Option<&str>,
        new_password: Option<&str>,
        new_scopes: Option<&[String]>,
    ) -> Result<User, UserError>;

    /// Re-authenticates and deletes the user, returning its pre-deletion
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::AdminProtected`] for the 'admin' user.
    async fn delete_user(&self, username: &str, password: &str) -> Result<User, UserError>;

    /// Deletes the target user on behalf of an admin-scoped caller, returning
    /// the target's pre-deletion snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidAdminCredentials`] if the caller fails
    /// authentication or lacks the "admin" or "users:admin" scope, and
    /// [`UserError::NotFound`] if the target does not exist.
    async fn delete_user_as_admin(
        &self,
        admin_username: &str,
        admin_password: &str,
        target_username: &str,
    ) -> Result<User, UserError>;
}

/// Canonicalize a scope list: deduplicated, sorted, `;`-joined.
///
/// Set-equal inputs produce identical strings regardless of order or
/// duplicate count.
#[must_use]
pub fn normalize_scopes(scopes: &[String]) -> String {
    let set: BTreeSet<&str> = scopes.iter().map(String::as_str).collect();
    set.into_iter().collect::<Vec<_>>().join(";")
}

/// Exact membership test against a canonical scope string.
#[must_use]
pub(crate) fn has_scope(scopes: &str, scope: &str) -> bool {
    scopes.split(';').any(|s| s == scope)
}
