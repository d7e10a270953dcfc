//! Crawler module for paged listing crawls
//!
//! This module contains the core crawling logic, including:
//! - Like-rate scoring and admission
//! - HTTP page fetching for ranking and popular listings
//! - The page-by-page stop/continue loop with pacing and retries
//! - Batch runs over the category registry

mod batch;
mod engine;
mod evaluator;
mod fetcher;
mod observer;
mod pacing;

pub use batch::{BatchRunner, BatchSummary, RunSummary};
pub use engine::{CrawlEngine, TargetSpec};
pub use evaluator::{QualityEvaluator, QualityScore, Rejection};
pub use fetcher::{build_http_client, Endpoint, HttpPageFetcher, PageFetcher};
pub use observer::{CrawlObserver, TracingObserver};
pub use pacing::{NoDelay, Pacer, RandomPacer, RetryPolicy};

pub use crate::state::CrawlOutcome;
