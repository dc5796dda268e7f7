//! Crawl report types
//!
//! A [`CrawlReport`] is filled in by the coordinator while a crawl runs and
//! returned once every sink has been closed.

use chrono::{DateTime, Utc};

/// Per-stage item counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkCounters {
    /// Stage name as reported by the sink
    pub name: String,

    /// Whether the stage was opened and took part in the crawl
    pub active: bool,

    /// Items the stage persisted or passed on
    pub persisted: u64,

    /// Items the stage dropped (duplicates)
    pub dropped: u64,

    /// Items the stage failed to handle
    pub failed: u64,
}

impl SinkCounters {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A category branch that stopped on an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFailure {
    pub category: String,
    pub error: String,
}

/// Summary of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Categories found on the seed page
    pub categories: usize,

    /// Category branches that reached their last page
    pub branches_finished: usize,

    /// Listing pages whose items reached the sinks
    pub pages: u64,

    /// Items extracted from those pages
    pub items: u64,

    pub branch_failures: Vec<BranchFailure>,

    /// True when the crawl was stopped by a shutdown request
    pub interrupted: bool,

    /// One entry per stage, in chain order
    pub sinks: Vec<SinkCounters>,
}

impl CrawlReport {
    /// Starts an empty report stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            categories: 0,
            branches_finished: 0,
            pages: 0,
            items: 0,
            branch_failures: Vec::new(),
            interrupted: false,
            sinks: Vec::new(),
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Looks up the counters of a stage by name
    pub fn sink(&self, name: &str) -> Option<&SinkCounters> {
        self.sinks.iter().find(|s| s.name == name)
    }
}

/// Prints a crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(secs) = report.duration_seconds() {
        println!("  Duration: {:.1}s", secs);
    }
    if report.interrupted {
        println!("  Status: interrupted");
    } else {
        println!("  Status: completed");
    }
    println!();

    println!("Walk:");
    println!("  Categories discovered: {}", report.categories);
    println!("  Categories completed: {}", report.branches_finished);
    println!("  Listing pages: {}", report.pages);
    println!("  Items extracted: {}", report.items);
    println!();

    println!("Sinks:");
    for sink in &report.sinks {
        if sink.active {
            println!(
                "  {}: {} persisted, {} dropped, {} failed",
                sink.name, sink.persisted, sink.dropped, sink.failed
            );
        } else {
            println!("  {}: skipped (failed to open)", sink.name);
        }
    }
    println!();

    if !report.branch_failures.is_empty() {
        println!("Failed Categories ({}):", report.branch_failures.len());
        for failure in &report.branch_failures {
            println!("  - {}: {}", failure.category, failure.error);
        }
        println!();
    }
}
