//! Output module for crawl reports and database statistics
//!
//! This module handles:
//! - The per-run crawl report returned by the coordinator
//! - Statistics over books already stored in the database

mod report;
pub mod stats;

pub use report::{print_report, BranchFailure, CrawlReport, SinkCounters};
pub use stats::{load_statistics, print_statistics, BookStatistics};
