//! Page walker for the two-level catalog
//!
//! The walker discovers categories from the seed page, then follows each
//! category's pagination chain in its own task. Every listing page becomes
//! one [`PageBatch`] sent to the coordinator, so a page's items stay together
//! and in on-page order.

use crate::config::Config;
use crate::crawler::archive::DebugArchive;
use crate::crawler::countries::CountryList;
use crate::crawler::fetcher::fetch_url;
use crate::crawler::parser::{parse_categories, parse_listing};
use crate::item::ItemRecord;
use crate::ShelfError;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Immutable context attached to every request of one category branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryContext {
    /// Category label shown in the side menu
    pub name: Arc<str>,

    /// First listing page of the category
    pub url: Url,
}

/// Items extracted from one listing page
#[derive(Debug, Clone)]
pub struct PageBatch {
    pub category: Arc<str>,
    pub page_url: Url,
    /// 1-based position of the page within its category
    pub page_number: u32,
    pub items: Vec<ItemRecord>,
}

/// Progress reported by the walker to the coordinator
#[derive(Debug)]
pub enum WalkEvent {
    /// Category discovery finished; branches are about to start
    CategoriesDiscovered(usize),

    /// One listing page was fetched and parsed
    Page(PageBatch),

    /// A category branch ran out of "next" links or hit a guard
    BranchFinished { category: Arc<str>, pages: u32 },

    /// A category branch stopped on an error; other branches continue
    BranchFailed { category: Arc<str>, error: String },
}

/// Walks category listings and emits page batches
pub struct PageWalker {
    client: Client,
    permits: Arc<Semaphore>,
    countries: Arc<CountryList>,
    archive: Option<DebugArchive>,
    max_pages_per_category: u32,
}

impl PageWalker {
    /// Creates a walker from the crawl configuration
    pub fn new(client: Client, config: &Config, countries: Arc<CountryList>) -> Self {
        let archive = config
            .archive
            .enabled
            .then(|| DebugArchive::new(&config.archive.directory, &config.archive.strip_prefix));

        Self {
            client,
            permits: Arc::new(Semaphore::new(
                config.crawler.max_concurrent_requests as usize,
            )),
            countries,
            archive,
            max_pages_per_category: config.crawler.max_pages_per_category,
        }
    }

    /// Fetches a page while holding a request permit
    ///
    /// Returns the final URL (after redirects) and the body.
    async fn fetch(&self, url: &Url) -> Result<(Url, String), ShelfError> {
        let _permit = self.permits.acquire().await.ok();
        let (final_url, body) = fetch_url(&self.client, url.as_str())
            .await
            .into_page(url.as_str())?;
        let final_url = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
        Ok((final_url, body))
    }

    /// Discovers the categories linked from the seed page
    ///
    /// Any failure degrades to an empty list so the crawl can still finish.
    pub async fn discover_categories(&self, seed: &Url) -> Vec<CategoryContext> {
        let (base_url, body) = match self.fetch(seed).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to fetch category list from {}: {}", seed, e);
                return Vec::new();
            }
        };

        match parse_categories(&body, &base_url) {
            Ok(links) => {
                tracing::info!("Discovered {} categories at {}", links.len(), seed);
                links
                    .into_iter()
                    .map(|link| CategoryContext {
                        name: Arc::from(link.name),
                        url: link.url,
                    })
                    .collect()
            }
            Err(e) => {
                tracing::error!("Failed to parse category list at {}: {}", seed, e);
                Vec::new()
            }
        }
    }

    /// Follows one category's pagination chain to its end
    ///
    /// Stops when no "next" link is present, when a page repeats (fragments
    /// ignored), or when the per-category page limit is reached. Fetch or
    /// parse failures end this branch with an error; on a malformed page the
    /// entries before the broken one are still sent.
    ///
    /// # Returns
    ///
    /// The number of pages fetched for the category
    pub async fn walk_category(
        &self,
        context: CategoryContext,
        events: &mpsc::Sender<WalkEvent>,
    ) -> Result<u32, ShelfError> {
        let mut visited: HashSet<Url> = HashSet::new();
        let mut next = Some(context.url.clone());
        let mut pages = 0u32;

        while let Some(page_url) = next.take() {
            if pages >= self.max_pages_per_category {
                tracing::warn!(
                    "Category '{}' reached the {} page limit before {}",
                    context.name,
                    self.max_pages_per_category,
                    page_url
                );
                break;
            }

            let mut page_key = page_url.clone();
            page_key.set_fragment(None);
            if !visited.insert(page_key) {
                tracing::warn!(
                    "Pagination cycle in category '{}': {} was already visited",
                    context.name,
                    page_url
                );
                break;
            }

            let (final_url, body) = self.fetch(&page_url).await?;
            pages += 1;

            self.archive_page(&page_url, &body).await;

            let listing = parse_listing(&body, &final_url).map_err(|message| {
                ShelfError::HtmlParse {
                    url: page_url.to_string(),
                    message,
                }
            })?;

            let items: Vec<ItemRecord> = listing
                .books
                .into_iter()
                .map(|book| book.into_item(&context.name, self.countries.choose()))
                .collect();

            tracing::debug!(
                "Page {} of '{}' yielded {} items: {}",
                pages,
                context.name,
                items.len(),
                page_url
            );

            let batch = PageBatch {
                category: Arc::clone(&context.name),
                page_url: page_url.clone(),
                page_number: pages,
                items,
            };
            events
                .send(WalkEvent::Page(batch))
                .await
                .map_err(|_| ShelfError::PipelineClosed {
                    url: page_url.to_string(),
                })?;

            // Entries before the broken one were delivered; the branch still ends here
            if let Some(message) = listing.malformed {
                return Err(ShelfError::HtmlParse {
                    url: page_url.to_string(),
                    message,
                });
            }

            next = listing.next_page;
        }

        Ok(pages)
    }

    async fn archive_page(&self, url: &Url, body: &str) {
        if let Some(archive) = &self.archive {
            match archive.store(url, body).await {
                Ok(path) => tracing::trace!("Archived {} to {}", url, path.display()),
                Err(e) => tracing::warn!("Failed to archive {}: {}", url, e),
            }
        }
    }

    /// Runs the full crawl: discovery, then one concurrent branch per category
    ///
    /// Branch failures are reported as [`WalkEvent::BranchFailed`] and never
    /// stop sibling branches. Dropping the returned future aborts all branches.
    pub async fn crawl(self: Arc<Self>, seed: Url, events: mpsc::Sender<WalkEvent>) {
        let categories = self.discover_categories(&seed).await;
        if events
            .send(WalkEvent::CategoriesDiscovered(categories.len()))
            .await
            .is_err()
        {
            return;
        }

        let mut branches = JoinSet::new();
        for context in categories {
            let walker = Arc::clone(&self);
            let events = events.clone();

            branches.spawn(async move {
                let category = Arc::clone(&context.name);
                let event = match walker.walk_category(context, &events).await {
                    Ok(pages) => WalkEvent::BranchFinished { category, pages },
                    Err(e) => {
                        tracing::error!("Category '{}' stopped: {}", category, e);
                        WalkEvent::BranchFailed {
                            category,
                            error: e.to_string(),
                        }
                    }
                };
                let _ = events.send(event).await;
            });
        }

        while let Some(joined) = branches.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Category branch task ended abnormally: {}", e);
            }
        }
    }
}
