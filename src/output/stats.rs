//! Summary statistics for crawl results
//!
//! This module computes and prints the per-run quality overview shown after
//! each export.

use crate::content::ContentRecord;
use crate::crawler::QualityScore;
use crate::output::traits::rank_records;
use crate::state::CrawlOutcome;

/// Number of top entries shown in a preview
const PREVIEW_LEN: usize = 3;

/// Characters of a title shown in a preview line
const PREVIEW_TITLE_CHARS: usize = 25;

/// Aggregate figures over the kept entries of a run
#[derive(Debug, Clone, PartialEq)]
pub struct QualityStats {
    /// Number of kept entries
    pub count: usize,

    /// Mean like rate
    pub mean_rate: f64,

    /// Highest like rate
    pub max_rate: QualityScore,

    /// Mean play count
    pub mean_views: f64,

    /// Mean like count
    pub mean_likes: f64,
}

impl QualityStats {
    /// Computes statistics; `None` when there are no records
    pub fn from_records(records: &[ContentRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let count = records.len();
        let n = count as f64;
        let rate_sum: f64 = records.iter().map(|r| r.score.as_f64()).sum();
        let views_sum: f64 = records.iter().map(|r| r.stats.impressions as f64).sum();
        let likes_sum: f64 = records.iter().map(|r| r.stats.approvals as f64).sum();
        let max_rate = records.iter().map(|r| r.score).max().unwrap_or_default();

        Some(Self {
            count,
            mean_rate: rate_sum / n,
            max_rate,
            mean_views: views_sum / n,
            mean_likes: likes_sum / n,
        })
    }
}

/// Prints a short report of one finished run to stdout
///
/// # Arguments
///
/// * `name` - Label of the run (category or feed name)
/// * `outcome` - The run's final result
pub fn print_run_report(name: &str, outcome: &CrawlOutcome) {
    println!("=== {} ===", name);
    println!(
        "  Kept: {} entries over {} pages (stopped: {})",
        outcome.records.len(),
        outcome.pages_fetched,
        outcome.stop_reason
    );

    if !outcome.errors.is_empty() {
        println!("  Errors: {}", outcome.errors);
    }

    if outcome.stop_reason.is_exhausted() {
        println!("  The listing stopped yielding entries above the threshold");
    }

    let Some(stats) = QualityStats::from_records(&outcome.records) else {
        println!("  No entries above the quality threshold");
        return;
    };

    println!(
        "  Mean like rate: {:.4}, max like rate: {}",
        stats.mean_rate, stats.max_rate
    );
    println!(
        "  Mean views: {:.0}, mean likes: {:.0}",
        stats.mean_views, stats.mean_likes
    );

    println!("  Top {}:", PREVIEW_LEN.min(stats.count));
    for entry in rank_records(&outcome.records).into_iter().take(PREVIEW_LEN) {
        let title: String = entry.record.title.chars().take(PREVIEW_TITLE_CHARS).collect();
        println!(
            "    {}. {} - {} - {}",
            entry.rank, title, entry.record.author, entry.record.score
        );
    }
}
