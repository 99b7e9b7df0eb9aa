//! Database access layer with connection pooling and migrations
//!
//! This module is organized by concern:
//! - `transactions` - Transaction reads and writes
//! - `transaction_filter` - Dynamic WHERE-clause builder for queries

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

mod transaction_filter;
mod transactions;

pub use transaction_filter::{FilterResult, TransactionFilter};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Format a timestamp for storage.
///
/// RFC 3339 in UTC with microseconds: fixed width, so lexicographic order in
/// SQL matches chronological order, and fine enough that the
/// `(date, created_at)` listing key stays stable across pages.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp back into a `DateTime<Utc>`.
pub(crate) fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a stored UUID column.
pub(crate) fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each pooled
    /// connection would otherwise get its own private in-memory database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/tally_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::open(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory
            PRAGMA temp_store = MEMORY;

            -- Transactions (per-user ledger, soft-deleted rows kept forever)
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                date DATE NOT NULL,
                amount TEXT NOT NULL,                      -- fixed-point decimal, 2 fractional digits
                kind TEXT NOT NULL,                        -- income, expense
                merchant TEXT NOT NULL,
                account TEXT NOT NULL,                     -- free-text account bucket
                category TEXT,
                category_confidence INTEGER,               -- automated categorization only
                category_source TEXT NOT NULL DEFAULT 'none',  -- none, user, automated
                notes TEXT,
                import_batch_id TEXT,                      -- set by the import service, not this core
                created_at TEXT NOT NULL,                  -- RFC 3339 UTC, microseconds
                updated_at TEXT,                           -- NULL until first update
                deleted_at TEXT                            -- NULL = live; set = invisible to every read
            );

            -- Index for common queries
            CREATE INDEX IF NOT EXISTS idx_transactions_owner_date ON transactions(owner_id, date);
            CREATE INDEX IF NOT EXISTS idx_transactions_owner_live ON transactions(owner_id, deleted_at);
            CREATE INDEX IF NOT EXISTS idx_transactions_owner_account ON transactions(owner_id, account);
            CREATE INDEX IF NOT EXISTS idx_transactions_owner_category ON transactions(owner_id, category);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
