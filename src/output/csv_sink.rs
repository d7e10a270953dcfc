//! CSV export
//!
//! Files start with a UTF-8 byte-order mark so spreadsheet tools pick the
//! right encoding for non-ASCII titles.

use crate::output::traits::{rank_records, OutputError, OutputResult, ResultSink, SinkReport};
use crate::state::CrawlOutcome;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column names, in file order
pub const COLUMNS: [&str; 15] = [
    "rank",
    "title",
    "author",
    "views",
    "likes",
    "like_rate",
    "coins",
    "favorites",
    "shares",
    "replies",
    "danmaku",
    "duration",
    "url",
    "id",
    "description",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    title: &'a str,
    author: &'a str,
    views: u64,
    likes: u64,
    like_rate: String,
    coins: u64,
    favorites: u64,
    shares: u64,
    replies: u64,
    danmaku: u64,
    duration: u64,
    url: String,
    id: &'a str,
    description: &'a str,
}

/// Writes one CSV file per run into a directory
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    content_url_base: String,
}

impl CsvSink {
    /// Creates a sink writing into `dir`
    ///
    /// # Arguments
    ///
    /// * `dir` - Output directory, created on first write
    /// * `content_url_base` - Prefix for the `url` column
    pub fn new(dir: impl Into<PathBuf>, content_url_base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            content_url_base: content_url_base.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file written for `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl ResultSink for CsvSink {
    fn write(&mut self, name: &str, outcome: &CrawlOutcome) -> OutputResult<SinkReport> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(OutputError::InvalidName(name.to_string()));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);

        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(COLUMNS)?;

        let ranked = rank_records(&outcome.records);
        for entry in &ranked {
            let record = entry.record;
            writer.serialize(CsvRow {
                rank: entry.rank,
                title: &record.title,
                author: &record.author,
                views: record.stats.impressions,
                likes: record.stats.approvals,
                like_rate: record.score.to_string(),
                coins: record.stats.cost,
                favorites: record.stats.bookmarks,
                shares: record.stats.shares,
                replies: record.stats.comments,
                danmaku: record.stats.danmaku,
                duration: record.duration,
                url: record.url(&self.content_url_base),
                id: &record.id,
                description: &record.description,
            })?;
        }
        writer.flush()?;

        tracing::debug!("Wrote {} rows to {}", ranked.len(), path.display());

        Ok(SinkReport {
            location: path.display().to_string(),
            rows: ranked.len(),
        })
    }
}

/// Removes earlier exports named `{prefix}-*.csv` from `dir`
///
/// A missing directory is created and counts as zero removals. Files that
/// cannot be removed are logged and skipped.
pub fn clear_previous_exports(dir: &Path, prefix: &str) -> OutputResult<usize> {
    fs::create_dir_all(dir)?;

    let head = format!("{}-", prefix);
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&head) && n.ends_with(".csv"))
            .unwrap_or(false);

        if !matches || !path.is_file() {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Removed previous export {}", path.display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentRecord, RawRecord};
    use crate::crawler::QualityScore;
    use crate::state::{ErrorTally, StopReason};
    use tempfile::TempDir;

    fn outcome(records: Vec<ContentRecord>) -> CrawlOutcome {
        CrawlOutcome {
            records,
            stop_reason: StopReason::TargetReached,
            pages_fetched: 1,
            last_page: 1,
            errors: ErrorTally::default(),
        }
    }

    fn record(id: &str, title: &str, units: u64) -> ContentRecord {
        let mut raw = RawRecord {
            id: id.to_string(),
            title: title.to_string(),
            ..Default::default()
        };
        raw.owner.name = "up".to_string();
        raw.stats.impressions = 10_000;
        raw.stats.approvals = units;
        ContentRecord::from_raw(&raw, QualityScore::from_units(units))
    }

    #[test]
    fn test_write_csv_with_bom_and_ranks() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvSink::new(dir.path(), "https://www.bilibili.com/video/");

        let report = sink
            .write(
                "TOP-音乐-high-quality",
                &outcome(vec![record("BV1", "低", 1200), record("BV2", "高, quoted", 2500)]),
            )
            .unwrap();

        assert_eq!(report.rows, 2);

        let bytes = fs::read(sink.path_for("TOP-音乐-high-quality")).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "1,\"高, quoted\",up,10000,2500,0.2500,0,0,0,0,0,0,https://www.bilibili.com/video/BV2,BV2,"
        );
        assert!(lines.next().unwrap().starts_with("2,低,up,10000,1200,0.1200,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_rejects_path_names() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvSink::new(dir.path(), "https://example.com/");

        let result = sink.write("../escape", &outcome(vec![]));
        assert!(matches!(result, Err(OutputError::InvalidName(_))));
    }

    #[test]
    fn test_clear_previous_exports() {
        let dir = TempDir::new().unwrap();
        for name in ["TOP-a.csv", "TOP-b.csv", "TOP-c.txt", "OTHER-a.csv"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let removed = clear_previous_exports(dir.path(), "TOP").unwrap();

        assert_eq!(removed, 2);
        assert!(dir.path().join("TOP-c.txt").exists());
        assert!(dir.path().join("OTHER-a.csv").exists());
        assert!(!dir.path().join("TOP-a.csv").exists());
    }

    #[test]
    fn test_clear_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("data").join("ranking");

        assert_eq!(clear_previous_exports(&nested, "TOP").unwrap(), 0);
        assert!(nested.is_dir());
    }
}
