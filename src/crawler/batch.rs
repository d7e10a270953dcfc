//! Batch runs across the category registry and the popular feed
//!
//! Ranking mode runs one single-page crawl per category and exports each
//! category's kept entries to its own file. Popular mode runs one
//! multi-page crawl and exports a single timestamped file. A run that keeps
//! nothing is reported and skipped; only output failures end a batch with an
//! error.

use crate::config::{CategoryEntry, Config};
use crate::crawler::engine::{CrawlEngine, TargetSpec};
use crate::crawler::fetcher::{Endpoint, HttpPageFetcher};
use crate::crawler::observer::TracingObserver;
use crate::crawler::pacing::{Pacer, RandomPacer};
use crate::output::{clear_previous_exports, ResultSink, SinkReport};
use crate::state::{CrawlOutcome, StopReason};
use crate::Result;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of one crawl within a batch
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Category name, or `popular`
    pub name: String,

    pub outcome: CrawlOutcome,

    /// Set when the kept entries were written
    pub export: Option<SinkReport>,
}

impl RunSummary {
    /// A run succeeds when it kept at least one entry
    pub fn succeeded(&self) -> bool {
        !self.outcome.is_empty()
    }
}

/// Results of a ranking batch, in category order
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub runs: Vec<RunSummary>,

    /// The batch stopped early because a category was blocked
    pub aborted: bool,

    /// The batch stopped early on cancellation
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.runs.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.succeeded()
    }
}

/// Drives crawl runs for the configured endpoints and exports the results
pub struct BatchRunner {
    config: Config,
    client: Client,
    cancel: CancellationToken,
}

impl BatchRunner {
    /// Creates a runner sharing `client` across all runs
    pub fn new(config: Config, client: Client) -> Self {
        Self {
            config,
            client,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops the current run and the rest of the batch when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// File name used for a category's ranking export
    pub fn ranking_export_name(&self, category: &CategoryEntry) -> String {
        format!("{}-{}-high-quality", self.config.output.csv_prefix, category.name)
    }

    /// Removes the previous ranking exports before a batch for `desired_count`
    ///
    /// The target is checked first, so an invalid request leaves earlier
    /// exports in place.
    pub fn clear_ranking_exports(&self, desired_count: usize) -> Result<usize> {
        TargetSpec::ranking(&self.config.crawler, desired_count).validate()?;

        let removed = clear_previous_exports(
            Path::new(&self.config.output.ranking_dir),
            &self.config.output.csv_prefix,
        )?;
        Ok(removed)
    }

    /// Crawls the ranking of each category in order
    ///
    /// # Arguments
    ///
    /// * `categories` - Categories to crawl, in order
    /// * `desired_count` - Entries to keep per category
    /// * `sink` - Receives each non-empty result
    ///
    /// # Returns
    ///
    /// * `Ok(BatchSummary)` - One summary per category that was crawled
    /// * `Err(SiftError)` - Invalid target, bad endpoint URL, or failed write
    pub async fn run_ranking(
        &self,
        categories: &[CategoryEntry],
        desired_count: usize,
        sink: &mut dyn ResultSink,
    ) -> Result<BatchSummary> {
        let target = TargetSpec::ranking(&self.config.crawler, desired_count);
        let mut between = RandomPacer::from_config(&self.config.crawler);
        let mut summary = BatchSummary::default();

        for (i, category) in categories.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            tracing::info!(
                "Crawling ranking for {} ({}/{})",
                category.name,
                i + 1,
                categories.len()
            );

            let endpoint = Endpoint::Ranking {
                category_id: category.id,
            };
            let outcome = self.crawl(endpoint, &category.name, &target).await?;
            let name = self.ranking_export_name(category);
            let run = self.export(&category.name, &name, outcome, sink)?;

            let stop_reason = run.outcome.stop_reason;
            let blocked = run.outcome.errors.blocked > 0;
            summary.runs.push(run);

            if stop_reason == StopReason::Cancelled {
                summary.cancelled = true;
                break;
            }

            if blocked && self.config.crawler.abort_on_blocked {
                tracing::warn!(
                    "Stopping batch after {}: the API is blocking requests",
                    category.name
                );
                summary.aborted = true;
                break;
            }

            if i + 1 < categories.len() {
                let delay = between.next_delay();
                tracing::debug!("Waiting {:.1}s before the next category", delay.as_secs_f64());

                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        tracing::info!(
            "Ranking batch finished: {} succeeded, {} failed",
            summary.succeeded(),
            summary.failed()
        );

        Ok(summary)
    }

    /// Crawls the popular feed across up to `max_pages` pages
    pub async fn run_popular(
        &self,
        desired_count: usize,
        max_pages: u32,
        sink: &mut dyn ResultSink,
    ) -> Result<RunSummary> {
        let target = TargetSpec::popular(&self.config.crawler, desired_count, max_pages);
        let outcome = self.crawl(Endpoint::Popular, "popular", &target).await?;

        let name = format!(
            "popular-high-quality-{}",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        self.export("popular", &name, outcome, sink)
    }

    async fn crawl(&self, endpoint: Endpoint, label: &str, target: &TargetSpec) -> Result<CrawlOutcome> {
        let fetcher = HttpPageFetcher::new(self.client.clone(), &self.config.api, endpoint)?;
        let mut engine = CrawlEngine::from_config(fetcher, &self.config.crawler)
            .with_observer(Arc::new(TracingObserver::new(label)))
            .with_cancellation(self.cancel.clone());

        engine.run(target).await
    }

    fn export(
        &self,
        label: &str,
        name: &str,
        outcome: CrawlOutcome,
        sink: &mut dyn ResultSink,
    ) -> Result<RunSummary> {
        let export = if outcome.is_empty() {
            tracing::warn!("[{}] No entries above the quality threshold, nothing written", label);
            None
        } else {
            let report = sink.write(name, &outcome)?;
            tracing::info!("[{}] Saved {} entries to {}", label, report.rows, report.location);
            Some(report)
        };

        Ok(RunSummary {
            name: label.to_string(),
            outcome,
            export,
        })
    }
}
