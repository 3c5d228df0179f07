//! End-to-end orchestration for one or more repositories.
//!
//! The pipeline owns the in-scope work: raw extraction and derived-table
//! assembly. Repository acquisition and table persistence are
//! collaborator concerns behind the [`RepoSource`] and [`TableSink`]
//! seams, with filesystem-backed defaults provided here.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{AcquireError, PipelineError};
use crate::extract::CommitExtractor;
use crate::schema::DerivedTable;
use crate::tables::{
    authors, general, words, AuthorsSummaryBuilder, GeneralTableBuilder, MessageStatsBuilder,
};
use crate::utils::delimited;

/// Supplies a repository checkout and disposes of it afterwards.
///
/// Cloning and deleting repositories happens outside the pipeline; it
/// only needs a valid checkout path for the extraction window.
pub trait RepoSource {
    /// Repository name, used as the raw-data subdirectory and the
    /// persisted-table prefix.
    fn name(&self) -> &str;

    /// Materialize (or validate) the checkout and return its path.
    fn acquire(&self) -> Result<PathBuf, AcquireError>;

    /// Dispose of the checkout once extraction is done.
    fn release(&self) -> Result<(), std::io::Error>;
}

/// A checkout that already exists on the local filesystem and is owned
/// by the caller.
pub struct LocalCheckout {
    path: PathBuf,
    name: String,
}

impl LocalCheckout {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_owned());
        Self { path, name }
    }
}

impl RepoSource for LocalCheckout {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&self) -> Result<PathBuf, AcquireError> {
        if !self.path.exists() {
            return Err(AcquireError::MissingCheckout {
                path: self.path.clone(),
            });
        }
        git2::Repository::open(&self.path).map_err(|source| AcquireError::NotARepository {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.path.clone())
    }

    fn release(&self) -> Result<(), std::io::Error> {
        // The caller owns the checkout; nothing to dispose of.
        Ok(())
    }
}

/// Receives derived tables keyed by repository prefix, replacing any
/// previously stored version.
pub trait TableSink {
    fn store(
        &self,
        prefix: &str,
        table: DerivedTable,
        rows: &[String],
    ) -> Result<(), std::io::Error>;
}

/// Writes each derived table as a delimited file in one directory, named
/// by the downstream table-name contract.
pub struct DelimitedDirSink {
    dir: PathBuf,
}

impl DelimitedDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TableSink for DelimitedDirSink {
    fn store(
        &self,
        prefix: &str,
        table: DerivedTable,
        rows: &[String],
    ) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", table.table_name(prefix)));
        delimited::write_table(&path, table.header(), rows.iter().cloned())
    }
}

/// Row counts and timing for one processed repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepoRunSummary {
    pub repository: String,
    pub commits: usize,
    pub authors: usize,
    pub distinct_raw_words: usize,
    pub distinct_stemmed_words: usize,
    pub elapsed_secs: f64,
}

/// Drives extraction and derived-table assembly, one repository at a
/// time.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one repository end to end: acquire the checkout, extract
    /// the raw tables, assemble the derived tables, hand them to the
    /// sink and release the checkout.
    pub async fn run_repo(
        &self,
        source: &dyn RepoSource,
        sink: &dyn TableSink,
        cancel: &CancellationToken,
    ) -> Result<RepoRunSummary, PipelineError> {
        let started = Instant::now();
        let repo = source.name().to_owned();
        info!(%repo, "processing repository");

        let checkout = source.acquire()?;
        let raw_dir = self.config.raw_data_dir.join(&repo);

        let extraction = |err| PipelineError::Extraction {
            repo: repo.clone(),
            source: err,
        };

        let extractor = CommitExtractor::new(&checkout, &raw_dir, &self.config);
        extractor.extract_all(cancel).await.map_err(&extraction)?;

        let general_rows = GeneralTableBuilder::new(&raw_dir).build().map_err(&extraction)?;
        let author_rows = AuthorsSummaryBuilder::new(&raw_dir).build().map_err(&extraction)?;
        let message_stats = MessageStatsBuilder::new(&raw_dir).build().map_err(&extraction)?;

        store(sink, &repo, DerivedTable::GeneralInfo, general::to_lines(&general_rows))?;
        store(sink, &repo, DerivedTable::AuthorsStats, authors::to_lines(&author_rows))?;
        store(
            sink,
            &repo,
            DerivedTable::MessagesAllWords,
            words::pair_lines(&message_stats.all_words),
        )?;
        store(
            sink,
            &repo,
            DerivedTable::MessagesRawWordsFreq,
            words::frequency_lines(&message_stats.raw_frequencies),
        )?;
        store(
            sink,
            &repo,
            DerivedTable::MessagesStemmedWordsFreq,
            words::frequency_lines(&message_stats.stemmed_frequencies),
        )?;

        source.release().map_err(|source| PipelineError::Cleanup {
            repo: repo.clone(),
            source,
        })?;

        let summary = RepoRunSummary {
            repository: repo,
            commits: general_rows.len(),
            authors: author_rows.len(),
            distinct_raw_words: message_stats.raw_frequencies.len(),
            distinct_stemmed_words: message_stats.stemmed_frequencies.len(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        info!(
            repo = %summary.repository,
            commits = summary.commits,
            authors = summary.authors,
            "repository processed"
        );
        Ok(summary)
    }
}

fn store(
    sink: &dyn TableSink,
    prefix: &str,
    table: DerivedTable,
    rows: Vec<String>,
) -> Result<(), PipelineError> {
    sink.store(prefix, table, &rows)
        .map_err(|source| PipelineError::Persistence {
            table: table.table_name(prefix),
            source,
        })
}

/// Serialize per-repository summaries to `run_summary.json` in the
/// results directory.
pub fn write_run_summary(dir: &Path, summaries: &[RepoRunSummary]) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(summaries)?;
    std::fs::write(dir.join("run_summary.json"), json)
}
