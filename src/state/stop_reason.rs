//! Stop reasons and error bookkeeping for a crawl run
use crate::content::{FetchError, RejectCode};
use std::fmt;

/// Why a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The desired number of entries was collected
    TargetReached,

    /// The last allowed page was fetched
    MaxPages,

    /// Too many consecutive pages produced nothing worth keeping
    EmptyPageCeiling,

    /// The run was cancelled from outside
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::MaxPages => "max_pages",
            Self::EmptyPageCeiling => "empty_page_ceiling",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if the run ended because the source ran dry
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::EmptyPageCeiling)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count of page fetch failures by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorTally {
    pub transport: u32,
    pub blocked: u32,
    pub rejected: u32,
    pub malformed: u32,
}

impl ErrorTally {
    pub fn record(&mut self, error: &FetchError) {
        match error {
            FetchError::Transport(_) => self.transport += 1,
            FetchError::ServerRejected(RejectCode::Blocked) => self.blocked += 1,
            FetchError::ServerRejected(_) => self.rejected += 1,
            FetchError::MalformedResponse(_) => self.malformed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.transport + self.blocked + self.rejected + self.malformed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for ErrorTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transport={} blocked={} rejected={} malformed={}",
            self.transport, self.blocked, self.rejected, self.malformed
        )
    }
}
