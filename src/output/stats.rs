//! Statistics generation from the book database
//!
//! This module provides functionality for extracting and displaying
//! what previous crawls have stored in the SQLite sink.

use crate::sink::{Sink, SqliteUpsertSink};
use crate::ShelfError;
use std::path::Path;

/// Book database statistics summary
#[derive(Debug, Clone, Default)]
pub struct BookStatistics {
    /// Total number of stored books
    pub total_books: u64,

    /// Stored books per category, largest first
    pub books_by_category: Vec<(String, u64)>,

    /// Stored books per star rating, ascending
    pub books_by_star: Vec<(u8, u64)>,
}

/// Loads statistics from the book database
///
/// # Arguments
///
/// * `database_path` - Path to the SQLite file written by the crawler
///
/// # Returns
///
/// * `Ok(BookStatistics)` - Successfully loaded statistics
/// * `Err(ShelfError)` - Failed to open or query the database
pub fn load_statistics(database_path: &Path) -> Result<BookStatistics, ShelfError> {
    let mut db = SqliteUpsertSink::new(database_path);
    db.open()?;

    let stats = BookStatistics {
        total_books: db.count_books()?,
        books_by_category: db.count_by_category()?,
        books_by_star: db.count_by_star()?,
    };

    db.close()?;
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BookStatistics) {
    println!("=== Book Statistics ===\n");

    println!("Overview:");
    println!("  Total books stored: {}", stats.total_books);
    println!("  Categories: {}", stats.books_by_category.len());
    println!();

    println!("Books by Category:");
    for (category, count) in &stats.books_by_category {
        let percentage = if stats.total_books > 0 {
            (*count as f64 / stats.total_books as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", category, count, percentage);
    }
    println!();

    println!("Books by Rating:");
    for (star, count) in &stats.books_by_star {
        let label = if *star == 0 {
            "unrated".to_string()
        } else {
            format!("{} star", star)
        };
        println!("  {}: {}", label, count);
    }
}
