//! Sink trait and error types
//!
//! A sink consumes normalized book records one at a time and owns whatever
//! durable resource it writes to.

use crate::item::ItemRecord;
use thiserror::Error;

/// Errors that can occur inside a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sink '{0}' is not open")]
    NotOpen(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for per-item pipeline stages
///
/// The coordinator calls `open` once before the first item, `process` for
/// every item in page order, and `close` exactly once after the crawl, even
/// when `process` failed. Implementations hold their resources exclusively;
/// the coordinator never calls a sink from two tasks at once.
pub trait Sink: Send {
    /// Short name used in logs and crawl reports
    fn name(&self) -> &str;

    /// Acquires resources and prepares the destination (schema, headers)
    ///
    /// Calling `open` on an already open sink is a no-op.
    fn open(&mut self) -> SinkResult<()>;

    /// Handles one item
    ///
    /// # Returns
    ///
    /// * `Ok(Some(item))` - The item was persisted or transformed; the returned
    ///   record is what later stages receive
    /// * `Ok(None)` - The item was dropped (e.g. a duplicate); not an error
    /// * `Err(SinkError)` - The sink failed to handle this item
    fn process(&mut self, item: ItemRecord) -> SinkResult<Option<ItemRecord>>;

    /// Releases resources; safe to call on a sink that is not open
    fn close(&mut self) -> SinkResult<()>;
}
