//! Crawler module for walking the catalog and feeding the sinks
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and error classification
//! - HTML parsing of category menus and listing pages
//! - Category branch walking with bounded concurrency
//! - Overall pipeline coordination

mod archive;
mod coordinator;
mod countries;
mod fetcher;
mod parser;
mod walker;

pub use archive::DebugArchive;
pub use coordinator::Coordinator;
pub use countries::{
    fetch_country_names, parse_country_names, CountryList, IndexSource, UNKNOWN_COUNTRY,
};
pub use fetcher::{build_http_client, fetch_url, user_agent_string, FetchResult};
pub use parser::{parse_categories, parse_listing, CategoryLink, ListingPage, ScrapedBook};
pub use walker::{CategoryContext, PageBatch, PageWalker, WalkEvent};

