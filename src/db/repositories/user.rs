use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;
use uuid::Uuid;

use crate::entities::auth_users;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Point lookup by username (unique index)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<auth_users::Model>, DbErr> {
        auth_users::Entity::find()
            .filter(auth_users::Column::Username.eq(username))
            .one(&self.conn)
            .await
    }

    /// Insert a new user row with a freshly generated id.
    ///
    /// A duplicate username surfaces as the store's unique-constraint
    /// violation; the caller decides how to report it.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: String,
        scopes: String,
    ) -> Result<auth_users::Model, DbErr> {
        let txn = self.conn.begin().await?;

        let user = auth_users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            scopes: Set(scopes),
        };
        let user = user.insert(&txn).await?;

        txn.commit().await?;
        Ok(user)
    }

    /// Apply a prepared update and return the refreshed row
    pub async fn update(&self, user: auth_users::ActiveModel) -> Result<auth_users::Model, DbErr> {
        let txn = self.conn.begin().await?;
        let user = user.update(&txn).await?;
        txn.commit().await?;
        Ok(user)
    }

    /// Delete a row and return its pre-deletion snapshot
    pub async fn delete(&self, user: auth_users::Model) -> Result<auth_users::Model, DbErr> {
        let txn = self.conn.begin().await?;

        let snapshot = user.clone();
        let user: auth_users::ActiveModel = user.into();
        user.delete(&txn).await?;

        txn.commit().await?;
        Ok(snapshot)
    }
}

/// Hash a password using Argon2id with a fresh random salt.
/// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
/// and would block the async runtime if run directly.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();

    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))
    })
    .await
    .context("Password hashing task panicked")?
}

/// Verify a password against a stored hash.
///
/// Returns `false` for a wrong password and also for an unreadable hash;
/// callers cannot tell the two apart.
pub async fn verify_password(password_hash: &str, password: &str) -> bool {
    let password_hash = password_hash.to_string();
    let password = password.to_string();

    task::spawn_blocking(move || {
        PasswordHash::new(&password_hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await
    .unwrap_or(false)
}
