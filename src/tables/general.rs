//! Assembly of the general commit info table.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use crate::error::ExtractionError;
use crate::tables::correlate::MergeCorrelator;
use crate::tables::load;
use crate::types::{
    ChangeStatRecord, CommitRecord, DateDetails, GeneralInfoRow, MergeRecord, MessageRecord,
    NearestMerge,
};
use crate::utils::delimited;

/// Joins the four raw tables into one commit-level row set.
pub struct GeneralTableBuilder {
    raw_dir: PathBuf,
}

impl GeneralTableBuilder {
    /// `raw_dir` is the per-repository directory the extractor wrote.
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn build(&self) -> Result<Vec<GeneralInfoRow>, ExtractionError> {
        let commits = load::commits_info(&self.raw_dir)?;
        let merges = load::merges_info(&self.raw_dir)?;
        let messages = load::commits_messages(&self.raw_dir)?;
        let stats = load::change_stats(&self.raw_dir)?;

        let rows = assemble(commits, &merges, messages, stats);
        info!(rows = rows.len(), "assembled general info table");
        Ok(rows)
    }
}

/// Left-join messages and change stats onto commit info by hash, derive
/// the date fields and resolve each commit's nearest subsequent merge.
/// Commits missing from a side table get an empty message or (0, 0)
/// stats.
pub fn assemble(
    commits: Vec<CommitRecord>,
    merges: &[MergeRecord],
    messages: Vec<MessageRecord>,
    stats: Vec<ChangeStatRecord>,
) -> Vec<GeneralInfoRow> {
    let mut messages: HashMap<String, String> = messages
        .into_iter()
        .map(|m| (m.commit_hash, m.commit_message))
        .collect();
    let stats: HashMap<String, (u64, u64)> = stats
        .into_iter()
        .map(|s| (s.commit_hash, (s.insertions, s.deletions)))
        .collect();
    let correlator = MergeCorrelator::new(merges);

    let mut rows = Vec::with_capacity(commits.len());
    for commit in commits {
        let (insertions, deletions) = stats.get(&commit.commit_hash).copied().unwrap_or((0, 0));
        let commit_message = messages.remove(&commit.commit_hash).unwrap_or_default();
        let nearest_merge = correlator
            .nearest_at_or_after(commit.commit_unix_time)
            .map(|m| NearestMerge {
                merge_hash: m.merge_hash.clone(),
                merge_unix_time: m.merge_unix_time,
                time_before_merge: m.merge_unix_time - commit.commit_unix_time,
            });
        let date = DateDetails::from_unix(commit.commit_unix_time);
        rows.push(GeneralInfoRow {
            commit,
            date,
            commit_message,
            insertions,
            deletions,
            nearest_merge,
        });
    }
    rows
}

/// Render rows as delimited lines in the derived-table column order.
pub fn to_lines(rows: &[GeneralInfoRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let (merge_hash, merge_time, before) = match &row.nearest_merge {
                Some(m) => (
                    m.merge_hash.clone(),
                    m.merge_unix_time.to_string(),
                    m.time_before_merge.to_string(),
                ),
                None => (String::new(), String::new(), String::new()),
            };
            delimited::join_fields(&[
                row.commit.commit_hash.clone(),
                row.commit.author_email.clone(),
                row.commit.author_name.clone(),
                row.commit.commit_unix_time.to_string(),
                row.commit.committer_email.clone(),
                row.commit.committer_name.clone(),
                row.date.date_str.clone(),
                row.date.year.to_string(),
                row.date.month.to_string(),
                row.date.month_day.to_string(),
                row.date.week_day.to_string(),
                row.date.hour.to_string(),
                row.commit_message.clone(),
                row.insertions.to_string(),
                row.deletions.to_string(),
                merge_hash,
                merge_time,
                before,
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commit(hash: &str, time: i64) -> CommitRecord {
        CommitRecord {
            commit_hash: hash.to_owned(),
            author_email: "dev@example.com".to_owned(),
            author_name: "Dev".to_owned(),
            commit_unix_time: time,
            committer_email: "dev@example.com".to_owned(),
            committer_name: "Dev".to_owned(),
        }
    }

    #[test]
    fn joins_all_tables_by_hash() {
        let commits = vec![commit("a", 100), commit("b", 200)];
        let merges = vec![MergeRecord {
            merge_hash: "m".to_owned(),
            merge_unix_time: 300,
        }];
        let messages = vec![
            MessageRecord {
                commit_hash: "a".to_owned(),
                commit_message: "first".to_owned(),
            },
            MessageRecord {
                commit_hash: "b".to_owned(),
                commit_message: "second".to_owned(),
            },
        ];
        let stats = vec![
            ChangeStatRecord {
                commit_hash: "a".to_owned(),
                insertions: 5,
                deletions: 1,
            },
            ChangeStatRecord {
                commit_hash: "b".to_owned(),
                insertions: 2,
                deletions: 0,
            },
        ];

        let rows = assemble(commits, &merges, messages, stats);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].commit_message, "first");
        assert_eq!((rows[0].insertions, rows[0].deletions), (5, 1));
        let merge = rows[0].nearest_merge.as_ref().unwrap();
        assert_eq!(merge.merge_hash, "m");
        assert_eq!(merge.time_before_merge, 200);
        assert_eq!(rows[1].nearest_merge.as_ref().unwrap().time_before_merge, 100);
    }

    #[test]
    fn missing_side_rows_default_instead_of_dropping_the_commit() {
        let rows = assemble(vec![commit("a", 100)], &[], vec![], vec![]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commit_message, "");
        assert_eq!((rows[0].insertions, rows[0].deletions), (0, 0));
        assert!(rows[0].nearest_merge.is_none());
    }

    #[test]
    fn rendered_lines_have_empty_merge_columns_when_unmatched() {
        let rows = assemble(vec![commit("a", 100)], &[], vec![], vec![]);
        let line = &to_lines(&rows)[0];
        assert!(line.ends_with(";;;"));
        assert_eq!(line.matches(';').count(), 17);
    }
}
