//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Account CRUD
//! - `transactions` - Transaction CRUD and batch inserts
//! - `templates` - Saved transaction templates
//! - `backup` - Whole-store snapshot and restore

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::debug;

use crate::error::Result;
use crate::taxonomy::Taxonomy;

mod accounts;
mod backup;
mod templates;
mod transactions;

#[cfg(test)]
mod tests;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Default database file used by the CLI
pub const DEFAULT_DB_PATH: &str = "finflow.db";

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    /// Categories that stored transactions must belong to
    taxonomy: &'static Taxonomy,
}

impl Database {
    /// Open (or create) a database file and run migrations
    pub fn new(path: &str) -> Result<Self> {
        Self::with_taxonomy(path, Taxonomy::standard())
    }

    /// Open a database that validates against a custom taxonomy
    pub fn with_taxonomy(path: &str, taxonomy: &'static Taxonomy) -> Result<Self> {
        // Foreign keys are per connection, so every pooled connection enables them
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(8).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
            taxonomy,
        };
        db.run_migrations()?;
        debug!(path, "Database opened");
        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    pub fn taxonomy(&self) -> &'static Taxonomy {
        self.taxonomy
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a fresh temporary file rather than `:memory:` so that every
    /// pooled connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "finflow_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations; safe to run on every open
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                account_type TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                sub_category TEXT,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                icon TEXT NOT NULL,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recurrence_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_recurrence ON transactions(recurrence_id);

            CREATE TABLE IF NOT EXISTS templates (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                kind TEXT NOT NULL,
                icon TEXT NOT NULL
            );
            "#,
        )?;

        debug!(path = %self.db_path, "Database migrations complete");
        Ok(())
    }
}

/// Parse a text column through `FromStr`, reporting bad values as conversion errors
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}
