//! Raw listing page archive
//!
//! Stores each fetched listing body on disk before it is parsed, so selector
//! breakage can be diagnosed after the fact. Nothing downstream reads these
//! files.

use std::path::PathBuf;
use url::Url;

/// Maps page URLs onto files below a root directory
#[derive(Debug, Clone)]
pub struct DebugArchive {
    root: PathBuf,
    strip_prefix: String,
}

impl DebugArchive {
    pub fn new(root: impl Into<PathBuf>, strip_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            strip_prefix: strip_prefix.into(),
        }
    }

    /// Returns the archive path for a page URL
    ///
    /// The configured prefix is removed when present; otherwise the host and
    /// path are used. Query strings and fragments are ignored, `.`/`..`
    /// segments are dropped, and a trailing slash maps to `index.html`.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let mut bare = url.clone();
        bare.set_query(None);
        bare.set_fragment(None);
        let full = bare.as_str();

        let relative = match full.strip_prefix(self.strip_prefix.as_str()) {
            Some(rest) if !self.strip_prefix.is_empty() => rest.to_string(),
            _ => format!("{}{}", url.host_str().unwrap_or("unknown-host"), url.path()),
        };

        let mut path = self.root.clone();
        let mut pushed = false;
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            path.push(sanitize_segment(segment));
            pushed = true;
        }

        if !pushed || relative.ends_with('/') {
            path.push("index.html");
        }

        path
    }

    /// Writes a page body to its archive path, creating directories as needed
    pub async fn store(&self, url: &Url, body: &str) -> std::io::Result<PathBuf> {
        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}

/// Replaces characters that are awkward in file names
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            ':' | '\\' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}
