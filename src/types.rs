//! # Common Types
//!
//! Record types for the raw commit tables and the derived summary tables
//! produced by one pipeline run.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::config::DATE_FORMAT;

/// A single non-merge commit as reported by the history query.
///
/// The hash is the natural key across all per-commit tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub commit_hash: String,
    pub author_email: String,
    pub author_name: String,
    pub commit_unix_time: i64,
    pub committer_email: String,
    pub committer_name: String,
}

/// A merge commit and the time it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRecord {
    pub merge_hash: String,
    pub merge_unix_time: i64,
}

/// Subject line of a commit message. Field separators inside the subject
/// are stripped at extraction time, so the stored text never contains one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    pub commit_hash: String,
    pub commit_message: String,
}

/// Total insertions and deletions of a commit against its parent.
///
/// (0, 0) when the diff reports no line changes or the extraction for
/// this commit failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeStatRecord {
    pub commit_hash: String,
    pub insertions: u64,
    pub deletions: u64,
}

/// Calendar fields derived from a unix timestamp, in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateDetails {
    pub date_str: String,
    pub year: i32,
    pub month: u32,
    pub month_day: u32,
    /// ISO weekday, Monday = 1 through Sunday = 7.
    pub week_day: u32,
    pub hour: u32,
}

impl DateDetails {
    /// Derive calendar fields from epoch seconds. Timestamps outside the
    /// representable range fall back to the epoch itself.
    pub fn from_unix(unix_time: i64) -> Self {
        let dt: DateTime<Utc> = DateTime::from_timestamp(unix_time, 0).unwrap_or_default();
        Self {
            date_str: dt.format(DATE_FORMAT).to_string(),
            year: dt.year(),
            month: dt.month(),
            month_day: dt.day(),
            week_day: dt.weekday().number_from_monday(),
            hour: dt.hour(),
        }
    }

    /// The calendar date the timestamp falls on.
    pub fn naive_date(unix_time: i64) -> NaiveDate {
        DateTime::from_timestamp(unix_time, 0)
            .unwrap_or_default()
            .date_naive()
    }
}

/// The merge a commit was folded into: the merge with the smallest
/// timestamp not earlier than the commit's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NearestMerge {
    pub merge_hash: String,
    pub merge_unix_time: i64,
    /// Seconds between the commit and the merge that absorbed it.
    pub time_before_merge: i64,
}

/// One fully joined commit-level row: commit info, message, change stats,
/// derived date fields and the nearest subsequent merge, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralInfoRow {
    #[serde(flatten)]
    pub commit: CommitRecord,
    #[serde(flatten)]
    pub date: DateDetails,
    pub commit_message: String,
    pub insertions: u64,
    pub deletions: u64,
    pub nearest_merge: Option<NearestMerge>,
}

/// Per-author rollup over the commit-level records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummaryRow {
    pub author_email: String,
    pub author_name: String,
    pub commits_number: u64,
    pub insertions_sum: u64,
    pub deletions_sum: u64,
    pub first_contribution_date: NaiveDate,
    pub last_contribution_date: NaiveDate,
    /// Whole days between first and last contribution; 0 for an author
    /// whose commits all fall on one day.
    pub days_of_activity: i64,
    /// insertions_sum / deletions_sum. Authors with zero deletions get
    /// (max finite ratio across all authors + 1) so they rank above
    /// everyone else without a non-finite value in the output.
    pub insertions_deletions_ratio: f64,
}

/// One exploded (raw, stemmed) token pair from a commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordPairRow {
    pub raw_word: String,
    pub stemmed_word: String,
}

/// Occurrence count of a single token across all commit messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordFrequencyRow {
    pub word: String,
    pub occurrences: u64,
}
