//! Reference country list
//!
//! Every book gets a country drawn uniformly from this list. The list is
//! fetched once per crawl and never changes afterwards; any failure falls
//! back to a single `"Unknown"` entry.

use reqwest::Client;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};

/// Sentinel used when no country data is available
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Source of random indices, injectable so tests can pin the sequence
pub trait IndexSource: Send {
    /// Returns an index in `0..len`; `len` is never zero
    fn next_index(&mut self, len: usize) -> usize;
}

impl IndexSource for fastrand::Rng {
    fn next_index(&mut self, len: usize) -> usize {
        self.usize(..len)
    }
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    #[serde(default)]
    name: Option<CountryName>,
}

#[derive(Debug, Deserialize)]
struct CountryName {
    #[serde(default)]
    common: Option<String>,
}

/// Parses the country API payload into common names
///
/// Entries without `name.common` become `"Unknown"`.
pub fn parse_country_names(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let entries: Vec<CountryEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .map(|entry| {
            entry
                .name
                .and_then(|name| name.common)
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
        })
        .collect())
}

/// Fetches the country names, falling back to `["Unknown"]` on any failure
pub async fn fetch_country_names(client: &Client, url: &str) -> Vec<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Country API error: {}", e);
            return vec![UNKNOWN_COUNTRY.to_string()];
        }
    };

    if !response.status().is_success() {
        tracing::warn!("Failed to fetch countries: HTTP {}", response.status());
        return vec![UNKNOWN_COUNTRY.to_string()];
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Country API error: {}", e);
            return vec![UNKNOWN_COUNTRY.to_string()];
        }
    };

    match parse_country_names(&body) {
        Ok(names) if !names.is_empty() => {
            tracing::info!("Loaded {} reference countries", names.len());
            names
        }
        Ok(_) => {
            tracing::warn!("Country API returned an empty list");
            vec![UNKNOWN_COUNTRY.to_string()]
        }
        Err(e) => {
            tracing::error!("Failed to decode country list: {}", e);
            vec![UNKNOWN_COUNTRY.to_string()]
        }
    }
}

/// Immutable country list with a shared random source
pub struct CountryList {
    names: Vec<String>,
    source: Mutex<Box<dyn IndexSource>>,
}

impl CountryList {
    /// Creates a list; an empty `names` becomes `["Unknown"]`
    pub fn new(names: Vec<String>, source: Box<dyn IndexSource>) -> Self {
        let names = if names.is_empty() {
            vec![UNKNOWN_COUNTRY.to_string()]
        } else {
            names
        };
        Self {
            names,
            source: Mutex::new(source),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Picks one country uniformly at random
    pub fn choose(&self) -> String {
        if self.names.len() == 1 {
            return self.names[0].clone();
        }

        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        let index = source.next_index(self.names.len()) % self.names.len();
        self.names[index].clone()
    }
}
