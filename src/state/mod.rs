//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: page index, kept entries and empty-page streak of one run
//! - `StopReason`: why a run ended
//! - `ErrorTally`: page fetch failures counted by kind

mod crawl_state;
mod stop_reason;

// Re-export main types
pub use crawl_state::{CrawlOutcome, CrawlState, PageReport};
pub use stop_reason::{ErrorTally, StopReason};
