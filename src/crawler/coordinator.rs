//! Pipeline coordinator - crawl orchestration and sink lifecycle
//!
//! The coordinator owns every sink. It opens them, spawns the page walker,
//! feeds each page batch through the stage chain one item at a time, and
//! closes the sinks in reverse order however the crawl ends.

use crate::config::Config;
use crate::crawler::countries::{fetch_country_names, CountryList, IndexSource};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::walker::{PageBatch, PageWalker, WalkEvent};
use crate::item::ItemRecord;
use crate::output::{BranchFailure, CrawlReport, SinkCounters};
use crate::sink::{build_sinks, RatingTransform, Sink};
use crate::state::PipelineState;
use crate::ShelfError;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Page batches buffered between the walker and the coordinator
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One entry in the stage chain
struct Stage {
    sink: Box<dyn Sink>,
    opened: bool,
    counters: SinkCounters,
}

impl Stage {
    fn new(sink: Box<dyn Sink>) -> Self {
        let counters = SinkCounters::new(sink.name());
        Self {
            sink,
            opened: false,
            counters,
        }
    }
}

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    stages: Vec<Stage>,
    state: PipelineState,
    index_source: Option<Box<dyn IndexSource>>,
}

impl Coordinator {
    /// Creates a coordinator with the sinks described by the output config
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, no resources acquired yet
    /// * `Err(ShelfError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, ShelfError> {
        let sinks = build_sinks(&config.output);
        Self::with_sinks(config, sinks)
    }

    /// Creates a coordinator with an explicit sink list
    ///
    /// The rating transform is always installed ahead of `sinks`.
    pub fn with_sinks(config: Config, sinks: Vec<Box<dyn Sink>>) -> Result<Self, ShelfError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        let mut stages = vec![Stage::new(Box::new(RatingTransform::new()))];
        stages.extend(sinks.into_iter().map(Stage::new));

        Ok(Self {
            config: Arc::new(config),
            client,
            stages,
            state: PipelineState::Idle,
            index_source: None,
        })
    }

    /// Replaces the random source used to pick countries
    pub fn with_index_source(mut self, source: Box<dyn IndexSource>) -> Self {
        self.index_source = Some(source);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Names of the stages in chain order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.sink.name().to_string()).collect()
    }

    /// Runs the crawl to completion
    pub async fn run(&mut self) -> Result<CrawlReport, ShelfError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until it completes or `shutdown` resolves
    ///
    /// Sinks are closed in both cases. A coordinator runs once; calling this
    /// again after it returned yields `InvalidTransition`.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlReport, ShelfError>
    where
        F: Future<Output = ()>,
    {
        self.transition(PipelineState::Opening)?;
        let mut report = CrawlReport::start();

        if let Err(e) = self.open_stages() {
            tracing::error!("Sink setup failed, aborting crawl: {}", e);
            self.transition(PipelineState::Closing)?;
            self.close_stages();
            self.transition(PipelineState::Closed)?;
            return Err(e);
        }

        self.transition(PipelineState::Running)?;
        let outcome = self.consume(shutdown, &mut report).await;

        self.transition(PipelineState::Closing)?;
        self.close_stages();
        self.transition(PipelineState::Closed)?;

        outcome?;

        report.sinks = self.stages.iter().map(|s| s.counters.clone()).collect();
        report.finish();

        tracing::info!(
            "Crawl finished: {} items from {} pages in {} categories",
            report.items,
            report.pages,
            report.categories
        );

        Ok(report)
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), ShelfError> {
        if !self.state.can_transition_to(next) {
            return Err(ShelfError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Opens every stage in chain order
    ///
    /// With `isolate-sink-failures` a stage that fails to open is skipped;
    /// otherwise the first failure is returned and the caller closes the
    /// stages opened so far.
    fn open_stages(&mut self) -> Result<(), ShelfError> {
        let isolate = self.config.output.isolate_sink_failures;

        for stage in &mut self.stages {
            match stage.sink.open() {
                Ok(()) => {
                    stage.opened = true;
                    stage.counters.active = true;
                }
                Err(source) if isolate => {
                    tracing::warn!(
                        "Sink '{}' failed to open and will be skipped: {}",
                        stage.sink.name(),
                        source
                    );
                }
                Err(source) => {
                    return Err(ShelfError::SinkOpen {
                        name: stage.sink.name().to_string(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    /// Closes every opened stage in reverse order, each at most once
    fn close_stages(&mut self) {
        for stage in self.stages.iter_mut().rev() {
            if !stage.opened {
                continue;
            }
            stage.opened = false;

            if let Err(e) = stage.sink.close() {
                tracing::error!("Sink '{}' failed to close: {}", stage.sink.name(), e);
            }
        }
    }

    /// Spawns the walker and drains its events until it finishes or shutdown
    async fn consume<F>(&mut self, shutdown: F, report: &mut CrawlReport) -> Result<(), ShelfError>
    where
        F: Future<Output = ()>,
    {
        let seed = Url::parse(&self.config.crawler.start_url)?;
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let config = Arc::clone(&self.config);
        let client = self.client.clone();
        let source = self
            .index_source
            .take()
            .unwrap_or_else(|| Box::new(fastrand::Rng::new()) as Box<dyn IndexSource>);

        let walk = tokio::spawn(async move {
            let names = fetch_country_names(&client, &config.crawler.countries_url).await;
            let countries = Arc::new(CountryList::new(names, source));
            let walker = Arc::new(PageWalker::new(client, &config, countries));
            walker.crawl(seed, tx).await;
        });

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::warn!("Shutdown requested, stopping the walker");
                    report.interrupted = true;
                    walk.abort();
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => self.handle_event(event, report),
                    None => break,
                },
            }
        }

        if let Err(e) = walk.await {
            if !e.is_cancelled() {
                tracing::error!("Walker task ended abnormally: {}", e);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: WalkEvent, report: &mut CrawlReport) {
        match event {
            WalkEvent::CategoriesDiscovered(count) => report.categories = count,
            WalkEvent::Page(batch) => self.process_batch(batch, report),
            WalkEvent::BranchFinished { category, pages } => {
                tracing::info!("Category '{}' finished after {} pages", category, pages);
                report.branches_finished += 1;
            }
            WalkEvent::BranchFailed { category, error } => {
                report.branch_failures.push(BranchFailure {
                    category: category.to_string(),
                    error,
                });
            }
        }
    }

    fn process_batch(&mut self, batch: PageBatch, report: &mut CrawlReport) {
        tracing::debug!(
            "Processing {} items from page {} of '{}'",
            batch.items.len(),
            batch.page_number,
            batch.category
        );

        report.pages += 1;
        for item in batch.items {
            report.items += 1;
            self.deliver(item);
        }
    }

    /// Runs one item through every opened stage in order
    ///
    /// A stage that returns a new record replaces the item for the stages
    /// after it. Drops and errors are counted and never stop delivery.
    fn deliver(&mut self, item: ItemRecord) {
        let mut current = item;

        for stage in self.stages.iter_mut().filter(|s| s.opened) {
            match stage.sink.process(current.clone()) {
                Ok(Some(next)) => {
                    stage.counters.persisted += 1;
                    current = next;
                }
                Ok(None) => stage.counters.dropped += 1,
                Err(e) => {
                    stage.counters.failed += 1;
                    tracing::error!(
                        "Sink '{}' failed on {}: {}",
                        stage.sink.name(),
                        current.product_url,
                        e
                    );
                }
            }
        }
    }
}
