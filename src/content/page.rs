//! Listing pages and the errors a page fetch can produce
//!
//! A listing response is a JSON envelope `{ code, message, data: { list } }`.
//! `parse_page` turns a response body into either a [`Page`] or the matching
//! [`FetchError`].

use crate::content::record::{null_as_default, RawRecord};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// API code signalling that the request was flagged as automated
pub const BLOCKED_CODE: i64 = -352;

/// One page of unfiltered entries, in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<RawRecord>,
}

impl Page {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why the remote side refused a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectCode {
    /// Anti-automation blocking
    Blocked,

    /// Non-zero application code other than blocking
    Api { code: i64, message: String },

    /// Non-success HTTP status
    Http(u16),
}

impl fmt::Display for RejectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked (code {})", BLOCKED_CODE),
            Self::Api { code, message } => write!(f, "api code {}: {}", code, message),
            Self::Http(status) => write!(f, "HTTP {}", status),
        }
    }
}

/// Errors produced by a single page fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server rejected request: {0}")]
    ServerRejected(RejectCode),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Returns true if the remote side reported anti-automation blocking
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::ServerRejected(RejectCode::Blocked))
    }

    /// Returns true if the error may clear up on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    message: String,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    list: Option<Vec<serde_json::Value>>,
}

/// Parses a listing response body
///
/// # Returns
///
/// * `Ok(Page)` - The envelope reported success and carried a list
/// * `Err(FetchError::ServerRejected)` - Non-zero application code
/// * `Err(FetchError::MalformedResponse)` - Invalid JSON or no `data.list`
pub fn parse_page(body: &str) -> Result<Page, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    match envelope.code {
        0 => {}
        BLOCKED_CODE => return Err(FetchError::ServerRejected(RejectCode::Blocked)),
        code => {
            return Err(FetchError::ServerRejected(RejectCode::Api {
                code,
                message: envelope.message,
            }))
        }
    }

    envelope
        .data
        .and_then(|data| data.list)
        .map(|items| Page::new(items.into_iter().filter_map(decode_item).collect()))
        .ok_or_else(|| FetchError::MalformedResponse("missing data.list".to_string()))
}

/// Decodes one list item; an item that does not fit is dropped
fn decode_item(item: serde_json::Value) -> Option<RawRecord> {
    match serde_json::from_value(item) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Skipping unreadable list entry: {}", e);
            None
        }
    }
}
