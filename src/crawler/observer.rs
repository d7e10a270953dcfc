//! Progress reporting hooks for crawl runs

use crate::content::FetchError;
use crate::state::{CrawlOutcome, PageReport};

/// Receives progress events from a crawl run
///
/// All hooks default to doing nothing.
pub trait CrawlObserver: Send + Sync {
    /// Called once per page, after its result has been recorded
    fn on_page(&self, _report: &PageReport) {}

    /// Called when a page fetch failed for good (after retries)
    fn on_fetch_error(&self, _page_index: u32, _error: &FetchError) {}

    /// Called before a failed fetch is retried
    fn on_retry(&self, _page_index: u32, _attempt: u32, _error: &FetchError) {}

    /// Called once when the run ends
    fn on_finish(&self, _outcome: &CrawlOutcome) {}
}

/// Reports progress through `tracing`
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl CrawlObserver for TracingObserver {
    fn on_page(&self, report: &PageReport) {
        if report.failed {
            return;
        }

        if report.admitted == 0 {
            tracing::info!(
                "[{}] Page {}: nothing kept from {} entries, empty streak {}",
                self.label,
                report.page_index,
                report.raw_count,
                report.empty_streak
            );
        } else {
            tracing::info!(
                "[{}] Page {}: kept {} of {} entries, total {}",
                self.label,
                report.page_index,
                report.admitted,
                report.raw_count,
                report.accumulated
            );
        }
    }

    fn on_fetch_error(&self, page_index: u32, error: &FetchError) {
        match error {
            FetchError::MalformedResponse(_) => tracing::error!(
                "[{}] Page {}: {} (the API response format may have changed)",
                self.label,
                page_index,
                error
            ),
            _ if error.is_blocked() => tracing::warn!(
                "[{}] Page {}: {} - consider longer delays between requests",
                self.label,
                page_index,
                error
            ),
            _ => tracing::warn!("[{}] Page {}: {}", self.label, page_index, error),
        }
    }

    fn on_retry(&self, page_index: u32, attempt: u32, error: &FetchError) {
        tracing::debug!(
            "[{}] Page {}: retry {} after {}",
            self.label,
            page_index,
            attempt,
            error
        );
    }

    fn on_finish(&self, outcome: &CrawlOutcome) {
        tracing::info!(
            "[{}] Finished ({}): {} entries kept over {} pages, errors: {}",
            self.label,
            outcome.stop_reason,
            outcome.records.len(),
            outcome.pages_fetched,
            outcome.errors
        );
    }
}
