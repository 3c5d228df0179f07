//! Raw commit data extraction.
//!
//! [`CommitExtractor`] queries a repository checkout through the `git`
//! binary and writes the five raw delimited tables into the repository's
//! output directory. Files are rewritten from scratch on every run, so
//! re-running against an unchanged checkout is idempotent.

mod git_cli;
mod shortstat;

pub use git_cli::{GitCli, LogFilter};
pub use shortstat::ShortstatLine;

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::ExtractionError;
use crate::schema::{RawTable, DELIMITER};
use crate::utils::delimited;

const MERGE_INFO_FORMAT: &str = "%H;%at";
const COMMIT_INFO_FORMAT: &str = "%H;%ae;%an;%at;%ce;%cn";
const MESSAGE_FORMAT: &str = "%H;%s";

/// Extracts the raw commit tables for one repository checkout.
pub struct CommitExtractor {
    git: GitCli,
    output_dir: PathBuf,
    stat_workers: usize,
}

impl CommitExtractor {
    /// `output_dir` is the per-repository directory the raw tables land
    /// in; it is created on the first write.
    pub fn new(
        repo_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            git: GitCli::new(repo_path),
            output_dir: output_dir.into(),
            stat_workers: config.stat_workers,
        }
    }

    fn write_table<I>(&self, table: RawTable, rows: I) -> Result<(), ExtractionError>
    where
        I: IntoIterator<Item = String>,
    {
        std::fs::create_dir_all(&self.output_dir)?;
        delimited::write_table(&table.path_in(&self.output_dir), table.header(), rows)?;
        Ok(())
    }

    /// Every non-merge commit hash, in the repository's traversal order.
    pub async fn extract_hashes(&self) -> Result<Vec<String>, ExtractionError> {
        let out = self.git.log(LogFilter::NoMerges, "%H").await?;
        let hashes: Vec<String> = out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        self.write_table(RawTable::CommitHashes, hashes.iter().cloned())?;
        info!(count = hashes.len(), "extracted commit hashes");
        Ok(hashes)
    }

    /// Merge hashes with their author timestamps.
    pub async fn extract_merges(&self) -> Result<usize, ExtractionError> {
        let out = self.git.log(LogFilter::MergesOnly, MERGE_INFO_FORMAT).await?;
        let rows: Vec<String> = out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        let count = rows.len();
        self.write_table(RawTable::MergesInfo, rows)?;
        info!(count, "extracted merges");
        Ok(count)
    }

    /// Hash, author and committer identity and author timestamp of every
    /// non-merge commit.
    pub async fn extract_commit_info(&self) -> Result<usize, ExtractionError> {
        let out = self.git.log(LogFilter::NoMerges, COMMIT_INFO_FORMAT).await?;
        let rows: Vec<String> = out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        let count = rows.len();
        self.write_table(RawTable::CommitsInfo, rows)?;
        info!(count, "extracted commit info");
        Ok(count)
    }

    /// Hash and subject line of every non-merge commit. Separators
    /// inside the subject are stripped, not escaped: the file format is
    /// positional.
    pub async fn extract_messages(&self) -> Result<usize, ExtractionError> {
        let out = self.git.log(LogFilter::NoMerges, MESSAGE_FORMAT).await?;
        let mut rows = Vec::new();
        for line in out.lines().filter(|line| !line.is_empty()) {
            let (hash, subject) = line.split_once(DELIMITER).unwrap_or((line, ""));
            let cleaned: String = subject.chars().filter(|&c| c != DELIMITER).collect();
            rows.push(delimited::join_fields(&[hash, cleaned.as_str()]));
        }
        let count = rows.len();
        self.write_table(RawTable::CommitsMessages, rows)?;
        info!(count, "extracted commit messages");
        Ok(count)
    }

    /// Insertion and deletion totals for a single commit against its
    /// parent. Any failure degrades to (0, 0) for that commit only.
    pub async fn extract_change_stats(&self, hash: &str) -> (u64, u64) {
        stat_for(&self.git, hash).await
    }

    /// Change stats for every commit in the hash table, fanned out over a
    /// bounded worker pool. Requires [`extract_hashes`] to have run
    /// first.
    ///
    /// Cancelling the token abandons commits not yet scheduled; rows
    /// already collected are still written. Returns the number of rows
    /// written.
    ///
    /// [`extract_hashes`]: CommitExtractor::extract_hashes
    pub async fn extract_change_stats_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<usize, ExtractionError> {
        let hashes_path = RawTable::CommitHashes.path_in(&self.output_dir);
        let hashes = delimited::read_table(&hashes_path, RawTable::CommitHashes.header())?;

        let semaphore = Arc::new(Semaphore::new(self.stat_workers));
        let mut tasks = Vec::with_capacity(hashes.len());
        let mut cancelled = false;

        for hash in hashes {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let git = self.git.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let (insertions, deletions) = stat_for(&git, &hash).await;
                (hash, insertions, deletions)
            }));
        }

        let mut rows = Vec::with_capacity(tasks.len());
        for result in join_all(tasks).await {
            match result {
                Ok((hash, insertions, deletions)) => rows.push(delimited::join_fields(&[
                    hash,
                    insertions.to_string(),
                    deletions.to_string(),
                ])),
                Err(err) => warn!(%err, "stat worker task failed"),
            }
        }

        if cancelled {
            warn!(
                written = rows.len(),
                "stat extraction cancelled, keeping rows collected so far"
            );
        }

        let written = rows.len();
        self.write_table(RawTable::InsertionsDeletions, rows)?;
        info!(count = written, "extracted change stats");
        Ok(written)
    }

    /// Run the five extractions in dependency order.
    pub async fn extract_all(&self, cancel: &CancellationToken) -> Result<(), ExtractionError> {
        self.extract_hashes().await?;
        self.extract_merges().await?;
        self.extract_commit_info().await?;
        self.extract_messages().await?;
        self.extract_change_stats_all(cancel).await?;
        Ok(())
    }
}

async fn stat_for(git: &GitCli, hash: &str) -> (u64, u64) {
    match git.shortstat(hash).await {
        Ok(out) => {
            let line = out
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("");
            ShortstatLine::classify(line).counts()
        }
        Err(err) => {
            debug!(%hash, %err, "diff stat unavailable, recording (0, 0)");
            (0, 0)
        }
    }
}
