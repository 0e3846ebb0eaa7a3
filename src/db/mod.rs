//! SQLite persistence for the journal and the local session.
//!
//! Stores everything needed between runs:
//! - Journal trades, partitioned by owner
//! - Known users and the active session
//! - The pending sign-in verification code

mod session;
mod trades;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub use session::{SessionStore, VerifyOutcome, CODE_TTL_MINUTES};
pub use trades::SqliteTradeStore;

/// Database connection pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Private in-memory database. A single connection keeps every query on the same database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        // Journal trades; decimals are TEXT to stay exact
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                pair TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT,
                quantity TEXT NOT NULL,
                quantity_type TEXT NOT NULL DEFAULT 'base',
                entry_date TEXT NOT NULL,
                exit_date TEXT,
                stop_loss TEXT,
                take_profit TEXT,
                leverage INTEGER NOT NULL DEFAULT 1,
                exchange TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                outcome TEXT NOT NULL DEFAULT 'pending',
                profit_loss TEXT NOT NULL DEFAULT '0',
                profit_loss_percent TEXT NOT NULL DEFAULT '0',
                fees TEXT NOT NULL DEFAULT '0',
                notes TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                screenshots TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Known users
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                last_login TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Active identity (at most one row)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                email TEXT NOT NULL,
                signed_in_at TEXT NOT NULL,
                FOREIGN KEY (email) REFERENCES users(email)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Pending verification code (at most one row)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS verification_codes (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                email TEXT NOT NULL,
                code TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_user ON trades(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Journal store sharing this pool.
    pub fn trades(&self) -> SqliteTradeStore {
        SqliteTradeStore::new(self.pool.clone())
    }

    /// Session store sharing this pool.
    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.pool.clone())
    }
}
