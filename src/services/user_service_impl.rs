//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use sea_orm::Set;

use crate::db::{Store, hash_password, is_unique_violation, verify_password};
use crate::entities::auth_users;
use crate::services::user_service::{User, UserError, UserService, has_scope, normalize_scopes};

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Sole self-service authentication primitive; reused by the update and
    /// delete paths. `None` covers both unknown username and wrong password.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<auth_users::Model>, UserError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Ok(None);
        };

        if verify_password(&user.password_hash, password).await {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create_user(
        &self,
        username: &str,
        password: &str,
        scopes: &[String],
    ) -> Result<User, UserError> {
        // Pre-check only; the unique index decides under races
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(UserError::AlreadyExists(username.to_string()));
        }

        let password_hash = hash_password(password).await?;
        let scopes = normalize_scopes(scopes);

        match self.store.insert_user(username, password_hash, scopes).await {
            Ok(user) => Ok(user.into()),
            Err(e) if is_unique_violation(&e) => Err(UserError::AlreadyExists(username.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn validate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        Ok(self.authenticate(username, password).await?.map(User::from))
    }

    async fn update_user(
        &self,
        username: &str,
        password: &str,
        new_username: Option<&str>,
        new_password: Option<&str>,
        new_scopes: Option<&[String]>,
    ) -> Result<User, UserError> {
        let Some(current) = self.authenticate(username, password).await? else {
            return Err(UserError::InvalidCredentials);
        };

        if new_username.is_none() && new_password.is_none() && new_scopes.is_none() {
            return Ok(current.into());
        }

        let current_id = current.id;
        let mut user: auth_users::ActiveModel = current.into();

        if let Some(new_username) = new_username {
            if username == "admin" {
                return Err(UserError::AdminUsernameImmutable);
            }

            // Collision pre-check; renaming to one's own name is a no-op
            if let Some(collision) = self.store.get_user_by_username(new_username).await?
                && collision.id != current_id
            {
                return Err(UserError::UsernameTaken(new_username.to_string()));
            }

            user.username = Set(new_username.to_string());
        }

        if let Some(new_password) = new_password {
            user.password_hash = Set(hash_password(new_password).await?);
        }

        if let Some(new_scopes) = new_scopes {
            user.scopes = Set(normalize_scopes(new_scopes));
        }

        match self.store.update_user(user).await {
            Ok(user) => Ok(user.into()),
            Err(e) if is_unique_violation(&e) => Err(UserError::UsernameTaken(
                new_username.unwrap_or(username).to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_user(&self, username: &str, password: &str) -> Result<User, UserError> {
        let Some(user) = self.authenticate(username, password).await? else {
            return Err(UserError::InvalidCredentials);
        };

        if username == "admin" {
            return Err(UserError::AdminProtected);
        }

        Ok(self.store.delete_user(user).await?.into())
    }

    async fn delete_user_as_admin(
        &self,
        admin_username: &str,
        admin_password: &str,
        target_username: &str,
    ) -> Result<User, UserError> {
        // Authorization is purely scope-based: even the real "admin" account
        // loses this path if its scopes no longer carry "admin".
        let admin = self
            .authenticate(admin_username, admin_password)
            .await?
            .filter(|u| has_scope(&u.scopes, "admin") || has_scope(&u.scopes, "users:admin"));

        if admin.is_none() {
            return Err(UserError::InvalidAdminCredentials);
        }

        let Some(target) = self.store.get_user_by_username(target_username).await? else {
            return Err(UserError::NotFound(target_username.to_string()));
        };

        Ok(self.store.delete_user(target).await?.into())
    }
}
