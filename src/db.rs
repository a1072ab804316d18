//! Database module for Word Quest
//!
//! Provides persistence for the global word pool, users, and per-user words.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Word already exists: {0}")]
    DuplicateWord(WordPair),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Global Pool ====================

    /// Insert the given pairs into the global pool, skipping ones already present.
    /// Returns the number of newly inserted pairs.
    pub fn seed_global_words(&self, pairs: &[(&str, &str)]) -> DbResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO words (source_text, target_text) VALUES (?1, ?2)",
            )?;
            for (source, target) in pairs {
                inserted += stmt.execute(params![source, target])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// List the global pool in insertion order
    pub fn list_global_words(&self) -> DbResult<Vec<WordPair>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT source_text, target_text FROM words ORDER BY id ASC")?;
        let rows = stmt.query_map([], parse_word_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    // ==================== User Operations ====================

    /// Register a user. Returns `true` if the user was newly inserted,
    /// `false` if the identity was already present.
    pub fn add_user(&self, identity: UserId, display_name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let now = Utc::now();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (identity, display_name, created_at) VALUES (?1, ?2, ?3)",
            params![identity, display_name, now.to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Get a user by identity
    #[allow(dead_code)] // Used in tests
    pub fn get_user(&self, identity: UserId) -> DbResult<User> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT identity, display_name, created_at FROM users WHERE identity = ?1",
            params![identity],
            |row| {
                Ok(User {
                    identity: row.get(0)?,
                    display_name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::UserNotFound(identity),
            other => DbError::Sqlite(other),
        })
    }

    /// List identities of all registered users
    pub fn list_user_ids(&self) -> DbResult<Vec<UserId>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT identity FROM users ORDER BY created_at ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    // ==================== User Word Operations ====================

    /// Effective vocabulary: global pool first, then the user's own pairs,
    /// each in insertion order
    pub fn list_user_words(&self, identity: UserId) -> DbResult<Vec<WordPair>> {
        let conn = self.lock()?;

        let mut global =
            conn.prepare("SELECT source_text, target_text FROM words ORDER BY id ASC")?;
        let mut words = global
            .query_map([], parse_word_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut own = conn.prepare(
            "SELECT source_text, target_text FROM user_words
             WHERE user_identity = ?1 ORDER BY id ASC",
        )?;
        let own_words = own
            .query_map(params![identity], parse_word_row)?
            .collect::<Result<Vec<_>, _>>()?;

        words.extend(own_words);
        Ok(words)
    }

    /// Add a pair to a user's own pool
    pub fn add_user_word(&self, identity: UserId, pair: &WordPair) -> DbResult<()> {
        let conn = self.lock()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE identity = ?1)",
            params![identity],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::UserNotFound(identity));
        }

        conn.execute(
            "INSERT INTO user_words (user_identity, source_text, target_text) VALUES (?1, ?2, ?3)",
            params![identity, pair.source_text, pair.target_text],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                DbError::DuplicateWord(pair.clone())
            }
            other => DbError::Sqlite(other),
        })?;
        Ok(())
    }

    /// Delete a user's own pair by its translation. The global pool is never
    /// touched. Returns the number of removed pairs (0 when absent).
    pub fn delete_user_word(&self, identity: UserId, target_text: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM user_words WHERE user_identity = ?1 AND target_text = ?2",
            params![identity, target_text],
        )?;
        Ok(deleted)
    }
}

fn parse_word_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WordPair> {
    Ok(WordPair {
        source_text: row.get(0)?,
        target_text: row.get(1)?,
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
