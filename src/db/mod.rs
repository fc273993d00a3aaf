use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

use crate::entities::auth_users;

pub mod migrator;
pub mod repositories;

use repositories::user::UserRepository;
pub use repositories::user::{hash_password, verify_password};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let is_memory = db_url.contains(":memory:");

        let mut opt = ConnectOptions::new(db_url.to_string());
        // An in-memory SQLite database exists per connection, so the pool
        // must not grow past one.
        opt.max_connections(if is_memory { 1 } else { max_connections })
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }

    /// Seed the distinguished "admin" user if it does not exist.
    ///
    /// Safe to call any number of times; a lost race against another instance
    /// counts as the already-exists branch.
    pub async fn ensure_admin(&self, admin_password: &str) -> Result<()> {
        let repo = self.user_repo();

        if repo.find_by_username("admin").await?.is_some() {
            info!("User 'admin' already exists; skipping creation.");
            return Ok(());
        }

        let password_hash = hash_password(admin_password).await?;
        match repo.insert("admin", password_hash, "admin".to_string()).await {
            Ok(_) => info!("Created new 'admin' user."),
            Err(e) if is_unique_violation(&e) => {
                info!("User 'admin' already exists; skipping creation.");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<auth_users::Model>, DbErr> {
        self.user_repo().find_by_username(username).await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: String,
        scopes: String,
    ) -> Result<auth_users::Model, DbErr> {
        self.user_repo().insert(username, password_hash, scopes).await
    }

    pub async fn update_user(
        &self,
        user: auth_users::ActiveModel,
    ) -> Result<auth_users::Model, DbErr> {
        self.user_repo().update(user).await
    }

    pub async fn delete_user(&self, user: auth_users::Model) -> Result<auth_users::Model, DbErr> {
        self.user_repo().delete(user).await
    }
}

/// The unique username index is the source of truth under insert/rename races
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
