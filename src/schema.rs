//! Typed descriptors for the raw and derived table schemas.
//!
//! The file names, headers and downstream table names form a fixed
//! contract with the persistence layer; resolving them through enums
//! keeps the lookups checked at compile time.

use std::path::{Path, PathBuf};

/// Field separator of the delimited tables. Values never contain it:
/// message subjects have it stripped at extraction time.
pub const DELIMITER: char = ';';

/// The five raw tables written by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawTable {
    CommitHashes,
    MergesInfo,
    CommitsInfo,
    CommitsMessages,
    InsertionsDeletions,
}

impl RawTable {
    pub const ALL: [RawTable; 5] = [
        RawTable::CommitHashes,
        RawTable::MergesInfo,
        RawTable::CommitsInfo,
        RawTable::CommitsMessages,
        RawTable::InsertionsDeletions,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            RawTable::CommitHashes => "commits_hashes_no_merges.csv",
            RawTable::MergesInfo => "merges_info.csv",
            RawTable::CommitsInfo => "commits_general_info.csv",
            RawTable::CommitsMessages => "commits_messages.csv",
            RawTable::InsertionsDeletions => "insertions_deletions.csv",
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            RawTable::CommitHashes => &["commit_hash"],
            RawTable::MergesInfo => &["merge_hash", "merge_unix_time"],
            RawTable::CommitsInfo => &[
                "commit_hash",
                "author_email",
                "author_name",
                "commit_unix_time",
                "committer_email",
                "committer_name",
            ],
            RawTable::CommitsMessages => &["commit_hash", "commit_message"],
            RawTable::InsertionsDeletions => &["commit_hash", "insertions", "deletions"],
        }
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// The derived tables handed to the persistence sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedTable {
    GeneralInfo,
    AuthorsStats,
    MessagesAllWords,
    MessagesRawWordsFreq,
    MessagesStemmedWordsFreq,
}

impl DerivedTable {
    pub const ALL: [DerivedTable; 5] = [
        DerivedTable::GeneralInfo,
        DerivedTable::AuthorsStats,
        DerivedTable::MessagesAllWords,
        DerivedTable::MessagesRawWordsFreq,
        DerivedTable::MessagesStemmedWordsFreq,
    ];

    fn suffix(self) -> &'static str {
        match self {
            DerivedTable::GeneralInfo => "general_commits_info",
            DerivedTable::AuthorsStats => "authors_stats",
            DerivedTable::MessagesAllWords => "messages_all_words",
            DerivedTable::MessagesRawWordsFreq => "messages_raw_words_freq",
            DerivedTable::MessagesStemmedWordsFreq => "messages_stemmed_words_freq",
        }
    }

    /// `{repo}_{suffix}`, the table-name contract of the downstream store.
    pub fn table_name(self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.suffix())
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            DerivedTable::GeneralInfo => &[
                "commit_hash",
                "author_email",
                "author_name",
                "commit_unix_time",
                "committer_email",
                "committer_name",
                "date_str",
                "commit_year",
                "commit_month",
                "commit_month_day",
                "commit_week_day",
                "commit_hour",
                "commit_message",
                "insertions",
                "deletions",
                "nearest_merge_hash",
                "merge_unix_time",
                "time_before_merge",
            ],
            DerivedTable::AuthorsStats => &[
                "author_email",
                "author_name",
                "commits_number",
                "insertions_sum",
                "deletions_sum",
                "first_contribution_date",
                "last_contribution_date",
                "days_of_activity",
                "insertions_deletions_ratio",
            ],
            DerivedTable::MessagesAllWords => &["raw_word", "stemmed_word"],
            DerivedTable::MessagesRawWordsFreq | DerivedTable::MessagesStemmedWordsFreq => {
                &["word", "occurrences"]
            }
        }
    }
}
