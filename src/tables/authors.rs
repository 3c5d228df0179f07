//! Per-author summary rollups.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::error::ExtractionError;
use crate::tables::load;
use crate::types::{AuthorSummaryRow, ChangeStatRecord, CommitRecord, DateDetails};
use crate::utils::delimited;

/// Groups commit-level records by author identity and computes totals,
/// the activity span and the insertions/deletions ratio.
pub struct AuthorsSummaryBuilder {
    raw_dir: PathBuf,
}

struct AuthorAccumulator {
    commits_number: u64,
    insertions_sum: u64,
    deletions_sum: u64,
    first: NaiveDate,
    last: NaiveDate,
}

impl AuthorsSummaryBuilder {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn build(&self) -> Result<Vec<AuthorSummaryRow>, ExtractionError> {
        let commits = load::commits_info(&self.raw_dir)?;
        let stats = load::change_stats(&self.raw_dir)?;
        let rows = summarize(commits, stats);
        info!(authors = rows.len(), "assembled authors summary table");
        Ok(rows)
    }
}

/// Roll commit records up by (author_email, author_name). Output is
/// ordered by that key, so repeated runs over the same input produce the
/// same table.
pub fn summarize(commits: Vec<CommitRecord>, stats: Vec<ChangeStatRecord>) -> Vec<AuthorSummaryRow> {
    let stats: HashMap<String, (u64, u64)> = stats
        .into_iter()
        .map(|s| (s.commit_hash, (s.insertions, s.deletions)))
        .collect();

    let mut groups: BTreeMap<(String, String), AuthorAccumulator> = BTreeMap::new();
    for commit in commits {
        let (insertions, deletions) = stats.get(&commit.commit_hash).copied().unwrap_or((0, 0));
        let date = DateDetails::naive_date(commit.commit_unix_time);
        let acc = groups
            .entry((commit.author_email, commit.author_name))
            .or_insert(AuthorAccumulator {
                commits_number: 0,
                insertions_sum: 0,
                deletions_sum: 0,
                first: date,
                last: date,
            });
        acc.commits_number += 1;
        acc.insertions_sum += insertions;
        acc.deletions_sum += deletions;
        acc.first = acc.first.min(date);
        acc.last = acc.last.max(date);
    }

    let max_finite_ratio = groups
        .values()
        .filter(|acc| acc.deletions_sum > 0)
        .map(|acc| acc.insertions_sum as f64 / acc.deletions_sum as f64)
        .fold(None::<f64>, |max, ratio| {
            Some(max.map_or(ratio, |m| m.max(ratio)))
        });
    // With no finite ratio to rank against (every author has zero
    // deletions), the maximum is taken as 0 and they all record 1.0.
    let undefined_ratio = max_finite_ratio.unwrap_or(0.0) + 1.0;

    groups
        .into_iter()
        .map(|((author_email, author_name), acc)| AuthorSummaryRow {
            author_email,
            author_name,
            commits_number: acc.commits_number,
            insertions_sum: acc.insertions_sum,
            deletions_sum: acc.deletions_sum,
            first_contribution_date: acc.first,
            last_contribution_date: acc.last,
            days_of_activity: (acc.last - acc.first).num_days(),
            insertions_deletions_ratio: if acc.deletions_sum == 0 {
                undefined_ratio
            } else {
                acc.insertions_sum as f64 / acc.deletions_sum as f64
            },
        })
        .collect()
}

/// Render rows as delimited lines in the derived-table column order.
pub fn to_lines(rows: &[AuthorSummaryRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            delimited::join_fields(&[
                row.author_email.clone(),
                row.author_name.clone(),
                row.commits_number.to_string(),
                row.insertions_sum.to_string(),
                row.deletions_sum.to_string(),
                row.first_contribution_date.to_string(),
                row.last_contribution_date.to_string(),
                row.days_of_activity.to_string(),
                row.insertions_deletions_ratio.to_string(),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DAY: i64 = 86_400;

    fn commit(hash: &str, email: &str, time: i64) -> CommitRecord {
        CommitRecord {
            commit_hash: hash.to_owned(),
            author_email: email.to_owned(),
            author_name: email.split('@').next().unwrap_or(email).to_owned(),
            commit_unix_time: time,
            committer_email: email.to_owned(),
            committer_name: email.to_owned(),
        }
    }

    fn stat(hash: &str, insertions: u64, deletions: u64) -> ChangeStatRecord {
        ChangeStatRecord {
            commit_hash: hash.to_owned(),
            insertions,
            deletions,
        }
    }

    #[test]
    fn sums_counts_and_spans_per_author() {
        let commits = vec![
            commit("a", "ann@example.com", 0),
            commit("b", "ann@example.com", 3 * DAY),
            commit("c", "bob@example.com", DAY),
        ];
        let stats = vec![stat("a", 10, 2), stat("b", 5, 3), stat("c", 7, 7)];

        let rows = summarize(commits, stats);
        assert_eq!(rows.len(), 2);

        let ann = &rows[0];
        assert_eq!(ann.author_email, "ann@example.com");
        assert_eq!(ann.commits_number, 2);
        assert_eq!(ann.insertions_sum, 15);
        assert_eq!(ann.deletions_sum, 5);
        assert_eq!(ann.days_of_activity, 3);
        assert_eq!(ann.insertions_deletions_ratio, 3.0);

        let bob = &rows[1];
        assert_eq!(bob.commits_number, 1);
        assert_eq!(bob.days_of_activity, 0);
        assert_eq!(bob.insertions_deletions_ratio, 1.0);
    }

    #[test]
    fn zero_deletion_author_ranks_above_the_max_finite_ratio() {
        let commits = vec![
            commit("a", "ann@example.com", 0),
            commit("b", "bob@example.com", 0),
        ];
        // Ann: 100/0 (undefined), Bob: 40/10 = 4.0 (the finite maximum).
        let stats = vec![stat("a", 100, 0), stat("b", 40, 10)];

        let rows = summarize(commits, stats);
        let ann = rows.iter().find(|r| r.author_email == "ann@example.com").unwrap();
        let bob = rows.iter().find(|r| r.author_email == "bob@example.com").unwrap();
        assert_eq!(bob.insertions_deletions_ratio, 4.0);
        assert_eq!(ann.insertions_deletions_ratio, 5.0);
    }

    #[test]
    fn all_zero_deletion_authors_record_one() {
        let commits = vec![
            commit("a", "ann@example.com", 0),
            commit("b", "bob@example.com", 0),
        ];
        let stats = vec![stat("a", 100, 0), stat("b", 7, 0)];

        let rows = summarize(commits, stats);
        assert!(rows
            .iter()
            .all(|r| r.insertions_deletions_ratio == 1.0));
    }

    #[test]
    fn authors_differing_only_by_name_are_separate() {
        let mut first = commit("a", "ann@example.com", 0);
        first.author_name = "Ann".to_owned();
        let mut second = commit("b", "ann@example.com", 0);
        second.author_name = "Ann B".to_owned();

        let rows = summarize(vec![first, second], vec![]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn commits_without_stats_count_as_zero_changes() {
        let rows = summarize(vec![commit("a", "ann@example.com", 0)], vec![]);
        assert_eq!(rows[0].insertions_sum, 0);
        assert_eq!(rows[0].deletions_sum, 0);
        assert_eq!(rows[0].commits_number, 1);
    }
}
