use serde::Deserialize;

/// Main configuration structure for Shelf-Scrape
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Listing page holding the category menu
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Endpoint returning the reference country list as JSON
    #[serde(rename = "countries-url")]
    pub countries_url: String,

    /// Maximum number of HTTP requests in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: u32,

    /// Maximum number of listing pages followed within one category
    #[serde(rename = "max-pages-per-category", default = "default_max_pages_per_category")]
    pub max_pages_per_category: u32,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Raw listing page archive, kept for debugging selector breakage
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_enabled")]
    pub enabled: bool,

    /// Root directory for archived page bodies
    #[serde(default = "default_archive_directory")]
    pub directory: String,

    /// URL prefix removed before mapping a page URL onto a file path
    #[serde(rename = "strip-prefix", default = "default_strip_prefix")]
    pub strip_prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: default_archive_enabled(),
            directory: default_archive_directory(),
            strip_prefix: default_strip_prefix(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// CSV export without the country column
    #[serde(rename = "books-path")]
    pub books_path: String,

    /// CSV export with the country column
    #[serde(rename = "books-with-country-path")]
    pub books_with_country_path: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Skip sinks that fail to open instead of aborting the crawl
    #[serde(rename = "isolate-sink-failures", default)]
    pub isolate_sink_failures: bool,
}

fn default_max_concurrent_requests() -> u32 {
    8
}

fn default_max_pages_per_category() -> u32 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_archive_enabled() -> bool {
    true
}

fn default_archive_directory() -> String {
    "debug_html".to_string()
}

fn default_strip_prefix() -> String {
    "https://books.toscrape.com/catalogue/category/".to_string()
}
