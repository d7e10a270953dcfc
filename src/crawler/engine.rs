//! Crawl engine - the page-by-page stop/continue loop
//!
//! The engine drives a [`PageFetcher`] across pages in strictly increasing
//! order, filters each page through the [`QualityEvaluator`], and feeds the
//! result into a [`CrawlState`], which decides whether the run continues.
//! Fetch failures never escape a run: they are reported to the observer and
//! counted as empty pages. The only error `run` returns is an invalid
//! [`TargetSpec`], detected before the first request.

use crate::config::CrawlerConfig;
use crate::content::{FetchError, Page};
use crate::crawler::evaluator::QualityEvaluator;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::observer::{CrawlObserver, TracingObserver};
use crate::crawler::pacing::{NoDelay, Pacer, RandomPacer, RetryPolicy};
use crate::state::{CrawlOutcome, CrawlState, PageReport};
use crate::{ConfigError, ConfigResult, SiftError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Limits for one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    /// Number of entries to collect
    pub desired_count: usize,

    /// Highest page index to request
    pub max_pages: u32,

    /// Consecutive empty or failed pages that end the run
    pub max_consecutive_empty_pages: u32,

    /// Entries requested per page
    pub page_size: u32,
}

impl TargetSpec {
    /// Limits for a category ranking, which is a single-page listing
    pub fn ranking(config: &CrawlerConfig, desired_count: usize) -> Self {
        Self {
            desired_count,
            max_pages: 1,
            max_consecutive_empty_pages: config.max_empty_pages,
            page_size: config.page_size,
        }
    }

    /// Limits for the paginated popular feed
    pub fn popular(config: &CrawlerConfig, desired_count: usize, max_pages: u32) -> Self {
        Self {
            desired_count,
            max_pages,
            max_consecutive_empty_pages: config.max_empty_pages,
            page_size: config.page_size,
        }
    }

    /// Checks that every limit is at least 1
    pub fn validate(&self) -> ConfigResult<()> {
        if self.desired_count == 0 {
            return Err(ConfigError::Validation(
                "desired count must be >= 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Validation(
                "max pages must be >= 1".to_string(),
            ));
        }
        if self.max_consecutive_empty_pages == 0 {
            return Err(ConfigError::Validation(
                "max consecutive empty pages must be >= 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Validation(
                "page size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs paginated, quality-filtered crawls over one fetcher
pub struct CrawlEngine<F> {
    fetcher: F,
    evaluator: QualityEvaluator,
    pacer: Box<dyn Pacer>,
    retry: RetryPolicy,
    observer: Arc<dyn CrawlObserver>,
    cancel: CancellationToken,
}

impl<F: PageFetcher> CrawlEngine<F> {
    /// Creates an engine with no pacing, no retries and tracing output
    pub fn new(fetcher: F, evaluator: QualityEvaluator) -> Self {
        Self {
            fetcher,
            evaluator,
            pacer: Box::new(NoDelay),
            retry: RetryPolicy::none(),
            observer: Arc::new(TracingObserver::new("crawl")),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates an engine with threshold, pacing and retries from configuration
    pub fn from_config(fetcher: F, config: &CrawlerConfig) -> Self {
        Self::new(fetcher, QualityEvaluator::new(config.quality_threshold))
            .with_pacer(RandomPacer::from_config(config))
            .with_retry(RetryPolicy::from_config(config))
    }

    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Uses `cancel` to stop the run from outside
    ///
    /// Cancellation is observed before each request and while waiting; a
    /// request in flight completes and is recorded first.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs one crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - Kept entries in fetch order and the stop reason
    /// * `Err(SiftError::Config)` - `target` has a zero limit
    pub async fn run(&mut self, target: &TargetSpec) -> Result<CrawlOutcome, SiftError> {
        target.validate()?;

        tracing::debug!(
            "Starting crawl: target {}, max pages {}, empty-page ceiling {}",
            target.desired_count,
            target.max_pages,
            target.max_consecutive_empty_pages
        );

        let mut state = CrawlState::new();

        while !state.is_terminal() {
            if self.cancel.is_cancelled() {
                state.cancel();
                break;
            }

            let page_index = state.page_index();
            let report = match self.fetch_with_retry(page_index, target.page_size).await {
                Ok(page) => self.absorb_page(&mut state, &page, target),
                Err(error) => {
                    self.observer.on_fetch_error(page_index, &error);
                    state.record_failure(&error, target)
                }
            };
            self.observer.on_page(&report);

            if state.is_terminal() {
                break;
            }

            let delay = self.pacer.next_delay();
            if !self.pause(delay).await {
                state.cancel();
            }
        }

        let outcome = state.into_outcome();
        self.observer.on_finish(&outcome);
        Ok(outcome)
    }

    fn absorb_page(
        &self,
        state: &mut CrawlState,
        page: &Page,
        target: &TargetSpec,
    ) -> PageReport {
        let evaluator = self.evaluator;
        let admitted = page
            .records
            .iter()
            .filter_map(|raw| match evaluator.admit(raw) {
                Ok(record) => Some(record),
                Err(rejection) => {
                    tracing::trace!("Skipping {}: {}", raw.id, rejection);
                    None
                }
            });

        state.record_page(admitted, page.len(), target)
    }

    async fn fetch_with_retry(&self, page_index: u32, page_size: u32) -> Result<Page, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(page_index, page_size).await {
                Err(error) if error.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    self.observer.on_retry(page_index, attempt, &error);
                    if !self.pause(self.retry.delay_for(attempt)).await {
                        return Err(error);
                    }
                }
                result => return result,
            }
        }
    }

    /// Waits for `delay`; returns false if cancelled first
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
