//! Mutable state of a single crawl run
//!
//! `CrawlState` is owned by exactly one run. The engine feeds it one page
//! result at a time through [`CrawlState::record_page`] or
//! [`CrawlState::record_failure`]; each call updates the counters and decides
//! whether the run continues. No I/O happens here, so the stop/continue
//! policy can be exercised with hand-built pages.

use crate::content::{ContentRecord, FetchError};
use crate::crawler::TargetSpec;
use crate::state::stop_reason::{ErrorTally, StopReason};
use std::collections::HashSet;

/// What happened on one page, as seen by observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    /// Index of the page this report describes
    pub page_index: u32,

    /// Entries returned by the fetch (0 when the fetch failed)
    pub raw_count: usize,

    /// Entries kept from this page
    pub admitted: usize,

    /// Entries kept so far in the run
    pub accumulated: usize,

    /// Consecutive pages without a kept entry, including this one
    pub empty_streak: u32,

    /// Whether the fetch itself failed
    pub failed: bool,

    /// Set when this page ended the run
    pub stop_reason: Option<StopReason>,
}

/// Final result of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Kept entries in fetch order
    pub records: Vec<ContentRecord>,

    pub stop_reason: StopReason,

    /// Number of fetch calls whose result was recorded
    pub pages_fetched: u32,

    /// Index of the last page the run reached
    pub last_page: u32,

    pub errors: ErrorTally,
}

impl CrawlOutcome {
    /// Returns true if nothing was kept, a soft failure for callers
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// State of a running crawl
#[derive(Debug, Clone)]
pub struct CrawlState {
    page_index: u32,
    records: Vec<ContentRecord>,
    seen_ids: HashSet<String>,
    empty_streak: u32,
    pages_fetched: u32,
    errors: ErrorTally,
    stop_reason: Option<StopReason>,
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlState {
    /// Creates the state for a fresh run, positioned on page 1
    pub fn new() -> Self {
        Self {
            page_index: 1,
            records: Vec::new(),
            seen_ids: HashSet::new(),
            empty_streak: 0,
            pages_fetched: 0,
            errors: ErrorTally::default(),
            stop_reason: None,
        }
    }

    /// Index of the page to fetch next, or of the last page once stopped
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn accumulated(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn errors(&self) -> &ErrorTally {
        &self.errors
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_terminal(&self) -> bool {
        self.stop_reason.is_some()
    }

    /// Number of entries still needed to reach the target
    pub fn remaining(&self, target: &TargetSpec) -> usize {
        target.desired_count.saturating_sub(self.records.len())
    }

    /// Records a successfully fetched page
    ///
    /// `admitted` yields the page's entries that passed the quality filter, in
    /// page order. It is consumed lazily: entries whose id was already kept are
    /// skipped, and consumption stops as soon as the target is met.
    pub fn record_page<I>(&mut self, admitted: I, raw_count: usize, target: &TargetSpec) -> PageReport
    where
        I: IntoIterator<Item = ContentRecord>,
    {
        debug_assert!(!self.is_terminal(), "page recorded after the run stopped");

        let remaining = self.remaining(target);
        let seen_ids = &mut self.seen_ids;
        let before = self.records.len();

        self.records.extend(
            admitted
                .into_iter()
                .filter(|record| record.id.is_empty() || seen_ids.insert(record.id.clone()))
                .take(remaining),
        );

        let kept = self.records.len() - before;
        self.finish_page(kept, raw_count, false, target)
    }

    /// Records a page whose fetch failed
    ///
    /// A failed page counts toward the empty-page ceiling exactly like a page
    /// with no kept entries.
    pub fn record_failure(&mut self, error: &FetchError, target: &TargetSpec) -> PageReport {
        debug_assert!(!self.is_terminal(), "page recorded after the run stopped");

        self.errors.record(error);
        self.finish_page(0, 0, true, target)
    }

    /// Stops the run with `Cancelled`, keeping everything collected so far
    pub fn cancel(&mut self) {
        if self.stop_reason.is_none() {
            self.stop_reason = Some(StopReason::Cancelled);
        }
    }

    fn finish_page(
        &mut self,
        admitted: usize,
        raw_count: usize,
        failed: bool,
        target: &TargetSpec,
    ) -> PageReport {
        self.pages_fetched += 1;

        if admitted == 0 {
            self.empty_streak += 1;
        } else {
            self.empty_streak = 0;
        }

        let reason = if self.records.len() >= target.desired_count {
            Some(StopReason::TargetReached)
        } else if self.empty_streak >= target.max_consecutive_empty_pages {
            Some(StopReason::EmptyPageCeiling)
        } else if self.page_index >= target.max_pages {
            Some(StopReason::MaxPages)
        } else {
            None
        };

        let report = PageReport {
            page_index: self.page_index,
            raw_count,
            admitted,
            accumulated: self.records.len(),
            empty_streak: self.empty_streak,
            failed,
            stop_reason: reason,
        };

        match reason {
            Some(reason) => self.stop_reason = Some(reason),
            None => self.page_index += 1,
        }

        report
    }

    /// Converts the state into the run's final outcome
    ///
    /// A state that never reached a stop condition is reported as cancelled.
    pub fn into_outcome(self) -> CrawlOutcome {
        CrawlOutcome {
            records: self.records,
            stop_reason: self.stop_reason.unwrap_or(StopReason::Cancelled),
            pages_fetched: self.pages_fetched,
            last_page: self.page_index,
            errors: self.errors,
        }
    }
}
