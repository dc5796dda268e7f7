//! SQL schema for the book table

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per product page; product_url is the natural key
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    price TEXT,
    availability TEXT,
    star INTEGER,
    cate TEXT,
    product_url TEXT UNIQUE,
    country TEXT
);

CREATE INDEX IF NOT EXISTS idx_books_cate ON books(cate);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
