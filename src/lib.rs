//! vidsift: a quality-filtered crawler for paginated video listings
//!
//! This crate pages through ranking and popular-feed listings, keeps only the
//! entries whose like rate clears a configured threshold, and stops as soon as a
//! target count is reached or the source stops yielding qualifying entries.

pub mod config;
pub mod content;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for vidsift operations
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

/// Result type alias for vidsift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use content::{ContentRecord, FetchError, Page, RawRecord, RejectCode};
pub use crawler::{CrawlEngine, CrawlOutcome, QualityEvaluator, QualityScore, TargetSpec};
pub use state::{CrawlState, StopReason};
