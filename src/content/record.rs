//! Record types for listing entries
//!
//! `RawRecord` mirrors one item of a listing response; `ContentRecord` is an
//! entry that passed the quality filter and carries its score.
use crate::crawler::QualityScore;
use serde::{Deserialize, Deserializer};

/// Deserializes an explicit `null` as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Maximum number of characters kept from an entry description
pub const DESCRIPTION_LIMIT: usize = 200;

/// Engagement counters attached to an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Engagement {
    /// Play count
    #[serde(rename = "view", deserialize_with = "null_as_default")]
    pub impressions: u64,

    /// Like count
    #[serde(rename = "like", deserialize_with = "null_as_default")]
    pub approvals: u64,

    /// Comment count
    #[serde(rename = "reply", deserialize_with = "null_as_default")]
    pub comments: u64,

    /// Share count
    #[serde(rename = "share", deserialize_with = "null_as_default")]
    pub shares: u64,

    /// Favorite count
    #[serde(rename = "favorite", deserialize_with = "null_as_default")]
    pub bookmarks: u64,

    /// Coins spent on the entry
    #[serde(rename = "coin", deserialize_with = "null_as_default")]
    pub cost: u64,

    /// Bullet-comment count
    #[serde(deserialize_with = "null_as_default")]
    pub danmaku: u64,
}

/// Uploader information
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Owner {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// One unfiltered entry as returned by a listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Stable content identifier
    #[serde(rename = "bvid", deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(deserialize_with = "null_as_default")]
    pub owner: Owner,

    #[serde(rename = "stat", deserialize_with = "null_as_default")]
    pub stats: Engagement,

    /// Length in seconds
    #[serde(deserialize_with = "null_as_default")]
    pub duration: u64,

    /// Publish time as a unix timestamp
    #[serde(rename = "pubdate", deserialize_with = "null_as_default")]
    pub published_at: i64,

    /// Cover image URL
    #[serde(rename = "pic", deserialize_with = "null_as_default")]
    pub cover_url: String,

    #[serde(rename = "desc", deserialize_with = "null_as_default")]
    pub description: String,
}

/// An entry admitted by the quality filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub stats: Engagement,
    pub duration: u64,
    pub published_at: i64,
    pub cover_url: String,
    pub description: String,
    pub score: QualityScore,
}

impl ContentRecord {
    /// Builds an admitted record from its raw form and computed score
    ///
    /// Title and description are trimmed; the description is cut to
    /// [`DESCRIPTION_LIMIT`] characters.
    pub fn from_raw(raw: &RawRecord, score: QualityScore) -> Self {
        Self {
            id: raw.id.clone(),
            title: raw.title.trim().to_string(),
            author: raw.owner.name.clone(),
            stats: raw.stats,
            duration: raw.duration,
            published_at: raw.published_at,
            cover_url: raw.cover_url.clone(),
            description: raw
                .description
                .trim()
                .chars()
                .take(DESCRIPTION_LIMIT)
                .collect(),
            score,
        }
    }

    /// Public URL of the entry, built from the configured prefix
    pub fn url(&self, content_url_base: &str) -> String {
        format!("{}{}", content_url_base, self.id)
    }
}
