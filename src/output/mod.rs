//! Output module for persisting and summarizing crawl results
//!
//! This module handles:
//! - Ranking kept entries by like rate
//! - Exporting ranked entries as CSV
//! - Printing per-run quality statistics

mod csv_sink;
pub mod stats;
mod traits;

pub use csv_sink::{clear_previous_exports, CsvSink, COLUMNS};
pub use stats::{print_run_report, QualityStats};
pub use traits::{rank_records, OutputError, OutputResult, RankedRecord, ResultSink, SinkReport};
