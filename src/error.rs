//! Typed pipeline errors, one variant per stage, so orchestrating
//! callers can react differently to acquire, extraction, cleanup and
//! persistence failures.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure to obtain a usable repository checkout.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("repository checkout not found at '{}'", path.display())]
    MissingCheckout { path: PathBuf },

    #[error("'{}' is not a git repository", path.display())]
    NotARepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },
}

/// Failure during raw-table extraction or derived-table assembly.
///
/// Per-commit stat failures are not represented here: they degrade to
/// (0, 0) rows and never abort the batch.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A table this step depends on has not been extracted yet.
    #[error("prerequisite file '{}' not found", path.display())]
    MissingPrerequisite { path: PathBuf },

    #[error("git {args:?} exited with {status}")]
    GitCommand { args: Vec<String>, status: ExitStatus },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed row {line_number} in '{}': {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line_number: usize,
        reason: String,
    },
}

/// Top-level pipeline failure, tagged with the stage it happened in.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("acquire stage failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("extraction stage failed for '{repo}': {source}")]
    Extraction {
        repo: String,
        #[source]
        source: ExtractionError,
    },

    #[error("cleanup stage failed for '{repo}': {source}")]
    Cleanup {
        repo: String,
        #[source]
        source: std::io::Error,
    },

    #[error("persistence stage failed for table '{table}': {source}")]
    Persistence {
        table: String,
        #[source]
        source: std::io::Error,
    },
}
