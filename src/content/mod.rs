//! Content module: listing entries and pages
//!
//! - `RawRecord` / `ContentRecord`: entries before and after the quality filter
//! - `Page`: one fetched listing page
//! - `FetchError`: everything that can go wrong fetching a page

mod page;
mod record;

pub use page::{parse_page, FetchError, Page, RejectCode, BLOCKED_CODE};
pub use record::{ContentRecord, Engagement, Owner, RawRecord, DESCRIPTION_LIMIT};
