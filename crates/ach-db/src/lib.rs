//! Storage layer for achievement tracking.
//!
//! Provides persistence for installed games and their achievement records
//! using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Observers run many watch tasks that write concurrently, so they go through
//! [`SharedDatabase`], which serializes access behind a `Mutex` and implements
//! the [`AchievementStore`] and [`GameCatalog`] collaborator traits.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format (e.g., `2024-01-15T10:30:00Z`).
//!
//! ## Achievement Records
//!
//! The `achievements` column stores the JSON-encoded canonical list for a game,
//! including current unlock state. The record is opaque to this crate; encoding
//! and decoding live in `ach_core::achievement`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ach_core::{AchievementStore, Game, GameCatalog, Shop, StoreError};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored shop value is not recognised.
    #[error("invalid shop for game {object_id}: {shop}")]
    InvalidShop { object_id: String, shop: String },
    /// Another thread panicked while holding the connection.
    #[error("database lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for DbError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A stored achievement record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementRecord {
    pub object_id: String,
    pub achievements: String,
    pub updated_at: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS games (
                object_id TEXT PRIMARY KEY,
                shop TEXT NOT NULL,
                title TEXT NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_deleted ON games(is_deleted);

            -- One canonical list per game, JSON encoded, with unlock state
            CREATE TABLE IF NOT EXISTS game_achievements (
                object_id TEXT PRIMARY KEY,
                achievements TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts a game or updates its shop and title. Re-adding a deleted game
    /// restores it.
    pub fn upsert_game(&self, game: &Game) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO games (object_id, shop, title, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(object_id) DO UPDATE SET
                shop = excluded.shop,
                title = excluded.title,
                is_deleted = excluded.is_deleted
            ",
            params![
                game.object_id,
                game.shop.as_str(),
                game.title,
                game.deleted,
                now_timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Marks a game deleted (or restores it). Returns whether a game matched.
    pub fn set_game_deleted(&self, object_id: &str, deleted: bool) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE games SET is_deleted = ?1 WHERE object_id = ?2",
            params![deleted, object_id],
        )?;
        Ok(updated > 0)
    }

    /// Looks up a game regardless of its deleted flag.
    pub fn get_game(&self, object_id: &str) -> Result<Option<Game>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT object_id, shop, title, is_deleted FROM games WHERE object_id = ?1",
                [object_id],
                read_game_row,
            )
            .optional()?;
        row.map(into_game).transpose()
    }

    /// Lists all games ordered by title then id.
    pub fn list_games(&self) -> Result<Vec<Game>, DbError> {
        self.query_games(
            "SELECT object_id, shop, title, is_deleted FROM games ORDER BY title ASC, object_id ASC",
        )
    }

    /// Lists games that have not been deleted.
    pub fn installed_games(&self) -> Result<Vec<Game>, DbError> {
        self.query_games(
            "
            SELECT object_id, shop, title, is_deleted FROM games
            WHERE is_deleted = 0
            ORDER BY title ASC, object_id ASC
            ",
        )
    }

    fn query_games(&self, sql: &str) -> Result<Vec<Game>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], read_game_row)?;
        let mut games = Vec::new();
        for row in rows {
            games.push(into_game(row?)?);
        }
        Ok(games)
    }

    /// Returns the stored achievement record for a game.
    pub fn get_achievement_record(&self, object_id: &str) -> Result<Option<AchievementRecord>, DbError> {
        let record = self
            .conn
            .query_row(
                "SELECT object_id, achievements, updated_at FROM game_achievements WHERE object_id = ?1",
                [object_id],
                |row| {
                    Ok(AchievementRecord {
                        object_id: row.get(0)?,
                        achievements: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Replaces the stored achievement record for a game.
    pub fn put_achievement_record(&self, object_id: &str, achievements: &str) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO game_achievements (object_id, achievements, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(object_id) DO UPDATE SET
                achievements = excluded.achievements,
                updated_at = excluded.updated_at
            ",
            params![object_id, achievements, now_timestamp()],
        )?;
        Ok(())
    }

    /// Removes a game's stored record. Returns whether one existed.
    pub fn delete_achievement_record(&self, object_id: &str) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM game_achievements WHERE object_id = ?1", [object_id])?;
        Ok(deleted > 0)
    }
}

type GameRow = (String, String, String, bool);

fn read_game_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GameRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_game((object_id, shop, title, deleted): GameRow) -> Result<Game, DbError> {
    let shop: Shop = shop
        .parse()
        .map_err(|_| DbError::InvalidShop {
            object_id: object_id.clone(),
            shop,
        })?;
    Ok(Game {
        object_id,
        shop,
        title,
        deleted,
    })
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A [`Database`] shared between watch tasks.
pub struct SharedDatabase {
    inner: Mutex<Database>,
}

impl SharedDatabase {
    pub const fn new(db: Database) -> Self {
        Self {
            inner: Mutex::new(db),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DbError> {
        Database::open(path).map(Self::new)
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Database>, DbError> {
        Ok(self.inner.lock()?)
    }
}

impl AchievementStore for SharedDatabase {
    fn get_achievement_record(&self, game_id: &str) -> Result<Option<String>, StoreError> {
        let record = self
            .lock()
            .and_then(|db| db.get_achievement_record(game_id))
            .map_err(StoreError::backend)?;
        Ok(record.map(|r| r.achievements))
    }

    fn put_achievement_record(&self, game_id: &str, record: &str) -> Result<(), StoreError> {
        tracing::debug!(game_id, bytes = record.len(), "writing achievement record");
        self.lock()
            .and_then(|db| db.put_achievement_record(game_id, record))
            .map_err(StoreError::backend)
    }
}

impl GameCatalog for SharedDatabase {
    fn installed_game(&self, game_id: &str) -> Result<Option<Game>, StoreError> {
        let game = self
            .lock()
            .and_then(|db| db.get_game(game_id))
            .map_err(StoreError::backend)?;
        Ok(game.filter(|g| !g.deleted))
    }

    fn installed_games(&self) -> Result<Vec<Game>, StoreError> {
        self.lock()
            .and_then(|db| db.installed_games())
            .map_err(StoreError::backend)
    }
}
