//! # Commit Statistics Pipeline
//!
//! `commitstats` extracts commit metadata from local Git repository
//! checkouts, transforms it into tabular summaries and hands the results
//! to a persistence sink.
//!
//! ## Features
//!
//! - Raw history extraction into five delimited tables per repository
//! - Nearest-subsequent-merge correlation for every commit
//! - Per-author contribution rollups
//! - Raw and stemmed word frequencies over commit messages
//! - Bounded parallel change-stat extraction with cooperative cancellation
//!
//! ## Example
//!
//! ```no_run
//! use commitstats::{DelimitedDirSink, LocalCheckout, Pipeline, PipelineConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), commitstats::PipelineError> {
//! let pipeline = Pipeline::new(PipelineConfig::new("raw_data", "results"));
//! let source = LocalCheckout::new("/path/to/checkout");
//! let sink = DelimitedDirSink::new("results");
//! let summary = pipeline
//!     .run_repo(&source, &sink, &CancellationToken::new())
//!     .await?;
//! println!("{} commits processed", summary.commits);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod schema;
pub mod tables;
pub mod types;
pub mod utils;

// Re-export the main entry points for convenience
pub use config::PipelineConfig;
pub use error::{AcquireError, ExtractionError, PipelineError};
pub use extract::CommitExtractor;
pub use pipeline::{
    DelimitedDirSink, LocalCheckout, Pipeline, RepoRunSummary, RepoSource, TableSink,
};
