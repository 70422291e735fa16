//! SQLite-based system of record for projects, tasks, activities, and the
//! gold-trading ledger.
//!
//! The database lives at `~/.goldledger/goldledger.db`. Every engine entry
//! point wraps its reads and writes in one `BEGIN IMMEDIATE` transaction
//! via `with_transaction`, which serializes concurrent writers and keeps
//! the completion and advance invariants safe under interleaving.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection};

pub mod types;
pub use types::*;

pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so the snapshot a
    /// closure reads (all tasks of a project, an advance's remaining
    /// balance) cannot be invalidated by a concurrent writer before the
    /// closure's own writes land.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| E::from(DbError::Sqlite(e)))?;
        match f(self) {
            Ok(val) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| E::from(DbError::Sqlite(e)))?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.goldledger/goldledger.db` and
    /// apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.goldledger/goldledger.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".goldledger").join("goldledger.db"))
    }

    /// Current UTC timestamp in the RFC 3339 form stored in TEXT columns.
    pub(crate) fn now() -> String {
        Utc::now().to_rfc3339()
    }
}

pub mod activities;
pub mod advances;
pub mod inventory;
pub mod projects;
pub mod suppliers;
pub mod tasks;
pub mod transactions;

// =============================================================================
// Shared test utilities
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
