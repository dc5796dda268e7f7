//! Sink module for delivering book records
//!
//! This module contains every per-item stage the coordinator fans out to:
//! - Dual CSV export (with and without the country column)
//! - SQLite table with a unique product URL
//! - Rating transform applied ahead of the writers

mod csv_export;
mod schema;
mod sqlite;
mod traits;
mod transform;

pub use csv_export::CsvExportSink;
pub use sqlite::SqliteUpsertSink;
pub use traits::{Sink, SinkError, SinkResult};
pub use transform::RatingTransform;

use crate::config::OutputConfig;

/// Builds the persistence sinks described by the output configuration
///
/// Order is fixed: CSV export first, then the database.
pub fn build_sinks(config: &OutputConfig) -> Vec<Box<dyn Sink>> {
    vec![
        Box::new(CsvExportSink::new(
            &config.books_path,
            &config.books_with_country_path,
        )),
        Box::new(SqliteUpsertSink::new(&config.database_path)),
    ]
}
