//! Configuration module for vidsift
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use vidsift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("vidsift.toml")).unwrap();
//! println!("Keeping entries above a like rate of {}", config.crawler.quality_threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_categories, ApiConfig, CategoryEntry, Config, CrawlerConfig, OutputConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
