//! SQLite sink keyed by product URL
//!
//! This is the only sink that enforces uniqueness: a record whose
//! `product_url` is already stored is dropped without error.

use crate::item::ItemRecord;
use crate::sink::schema::initialize_schema;
use crate::sink::traits::{Sink, SinkError, SinkResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::PathBuf;

const NAME: &str = "sqlite-upsert";

/// SQLite-backed sink that inserts each unseen product once
pub struct SqliteUpsertSink {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteUpsertSink {
    /// Creates an unopened sink for the given database file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    fn conn(&self) -> SinkResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| SinkError::NotOpen(NAME.to_string()))
    }

    /// Counts all stored books
    pub fn count_books(&self) -> SinkResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Counts stored books per category, largest first
    pub fn count_by_category(&self) -> SinkResult<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT COALESCE(cate, ''), COUNT(*) FROM books GROUP BY cate ORDER BY COUNT(*) DESC, cate",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Counts stored books per star rating, ascending by rating
    pub fn count_by_star(&self) -> SinkResult<Vec<(u8, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT COALESCE(star, 0), COUNT(*) FROM books GROUP BY star ORDER BY star",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Returns true for SQLite unique/primary-key violations
fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

impl Sink for SqliteUpsertSink {
    fn name(&self) -> &str {
        NAME
    }

    fn open(&mut self) -> SinkResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;

        tracing::debug!("Opened book database at {}", self.path.display());
        self.conn = Some(conn);
        Ok(())
    }

    fn process(&mut self, item: ItemRecord) -> SinkResult<Option<ItemRecord>> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| SinkError::NotOpen(NAME.to_string()))?;

        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM books WHERE product_url = ?1",
                params![item.product_url],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            tracing::info!(
                "Product URL {} already exists in the database",
                item.product_url
            );
            return Ok(None);
        }

        let inserted = tx.execute(
            "INSERT INTO books (title, price, availability, star, cate, product_url, country)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.title,
                item.price,
                item.availability,
                item.star.stars(),
                item.category,
                item.product_url,
                item.country,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                tracing::info!(
                    "Product URL {} rejected by unique constraint",
                    item.product_url
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        tracing::debug!("Inserted {} into the database", item.product_url);
        Ok(Some(item))
    }

    fn close(&mut self) -> SinkResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| SinkError::Sqlite(e))?;
        }
        Ok(())
    }
}
