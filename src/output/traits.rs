//! Result sink trait and ranking helpers
//!
//! A sink receives the outcome of a finished crawl run and persists it in
//! rank order.

use crate::content::ContentRecord;
use crate::state::CrawlOutcome;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output name: {0}")]
    InvalidName(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// An admitted entry with its position in the final ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedRecord<'a> {
    /// 1-based rank, 1 being the highest score
    pub rank: usize,
    pub record: &'a ContentRecord,
}

/// Where and how much a sink wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub location: String,
    pub rows: usize,
}

/// Receives the final results of a crawl run
pub trait ResultSink {
    /// Persists `outcome` under `name`, ranked by descending score
    fn write(&mut self, name: &str, outcome: &CrawlOutcome) -> OutputResult<SinkReport>;
}

/// Ranks records by descending score
///
/// Ranks run 1..=N without gaps. Ties keep fetch order.
pub fn rank_records(records: &[ContentRecord]) -> Vec<RankedRecord<'_>> {
    let mut sorted: Vec<&ContentRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, record)| RankedRecord { rank: i + 1, record })
        .collect()
}
