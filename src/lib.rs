//! Shelf-Scrape: a book catalog crawler
//!
//! This crate walks a paginated book catalog, normalizes every listed book
//! and fans the records out to a set of durable sinks (CSV exports and a
//! SQLite table keyed by product URL).

pub mod config;
pub mod crawler;
pub mod item;
pub mod output;
pub mod sink;
pub mod state;

use thiserror::Error;

/// Main error type for Shelf-Scrape operations
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("Sink '{name}' failed to open: {source}")]
    SinkOpen {
        name: String,
        source: sink::SinkError,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Invalid pipeline transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PipelineState,
        to: state::PipelineState,
    },

    #[error("Item pipeline closed while walking {url}")]
    PipelineClosed { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Shelf-Scrape operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use item::{normalize_item, star_count, ItemRecord, StarRating};
pub use output::CrawlReport;
pub use state::PipelineState;
