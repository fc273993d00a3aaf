use anyhow::{Context, Result};

/// Application settings, sourced from environment variables (a `.env` file is
/// honored if present).
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the relational store. A Postgres URL in
    /// production; tests run against `sqlite::memory:`.
    pub pg_dsn: String,

    /// Symmetric key for signing session tokens. At least 32 characters.
    pub jwt_key: String,

    /// Initial password for the "admin" user if it does not exist.
    pub admin_password: String,

    /// Listen address for the HTTP facade.
    pub bind_addr: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            pg_dsn: std::env::var("PG_DSN").context("PG_DSN must be set")?,
            jwt_key: std::env::var("JWT_KEY").context("JWT_KEY must be set")?,
            admin_password: std::env::var("ADMIN_PASSWORD")
                .context("ADMIN_PASSWORD must be set")?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.pg_dsn.is_empty() {
            anyhow::bail!("PG_DSN cannot be empty");
        }

        if self.jwt_key.len() < 32 {
            anyhow::bail!("JWT_KEY must be at least 32 characters long");
        }

        Ok(())
    }
}
