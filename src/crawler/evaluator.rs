//! Quality evaluation
//!
//! The quality score of an entry is its like rate: approvals divided by
//! impressions, kept at four decimal digits. Rounding is half-up and done on
//! integers, so equal inputs always produce the same score.

use crate::content::{ContentRecord, RawRecord};
use std::fmt;
use thiserror::Error;

/// Score units per 1.0 (four decimal digits)
const SCALE: u64 = 10_000;

/// A like rate with four decimal digits of precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualityScore(u64);

impl QualityScore {
    /// Computes approvals / impressions rounded half-up to four decimals
    ///
    /// Returns `None` when `impressions` is zero.
    pub fn from_counts(impressions: u64, approvals: u64) -> Option<Self> {
        if impressions == 0 {
            return None;
        }
        // round(a / i * SCALE) == floor((2 * a * SCALE + i) / (2 * i))
        let numerator = 2 * approvals as u128 * SCALE as u128 + impressions as u128;
        let units = numerator / (2 * impressions as u128);
        Some(Self(u64::try_from(units).unwrap_or(u64::MAX)))
    }

    /// Builds a score from ten-thousandths
    pub fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// The score in ten-thousandths
    pub fn units(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl fmt::Display for QualityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / SCALE, self.0 % SCALE)
    }
}

/// Why an entry was left out of the results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("entry has no impressions")]
    ZeroImpressions,

    #[error("score {score} does not exceed the threshold")]
    BelowThreshold { score: QualityScore },
}

/// Decides which entries are kept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityEvaluator {
    threshold: f64,
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

impl QualityEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores a pair of counters
    ///
    /// The rounded score must be strictly greater than the threshold; a score
    /// equal to the threshold is rejected.
    pub fn evaluate(&self, impressions: u64, approvals: u64) -> Result<QualityScore, Rejection> {
        let score =
            QualityScore::from_counts(impressions, approvals).ok_or(Rejection::ZeroImpressions)?;

        if score.as_f64() > self.threshold {
            Ok(score)
        } else {
            Err(Rejection::BelowThreshold { score })
        }
    }

    /// Scores a raw entry and builds its admitted form
    pub fn admit(&self, raw: &RawRecord) -> Result<ContentRecord, Rejection> {
        let score = self.evaluate(raw.stats.impressions, raw.stats.approvals)?;
        Ok(ContentRecord::from_raw(raw, score))
    }
}
