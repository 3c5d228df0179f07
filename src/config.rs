//! Pipeline configuration.
//!
//! One value object constructed up front (usually from the CLI) and
//! passed to each component, instead of module-level mutable settings.

use std::path::PathBuf;

/// Format of the derived `date_str` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving one raw-table subdirectory per repository.
    pub raw_data_dir: PathBuf,
    /// Directory the derived tables and run summary are written to.
    pub results_dir: PathBuf,
    /// Upper bound on concurrent per-commit stat extractions.
    pub stat_workers: usize,
}

impl PipelineConfig {
    pub fn new(raw_data_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_data_dir: raw_data_dir.into(),
            results_dir: results_dir.into(),
            stat_workers: default_stat_workers(),
        }
    }

    pub fn with_stat_workers(mut self, workers: usize) -> Self {
        self.stat_workers = workers.max(1);
        self
    }
}

/// Use 75% of available CPUs to leave room for other system processes.
pub fn default_stat_workers() -> usize {
    (num_cpus::get() * 3 / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_workers_never_zero() {
        assert!(default_stat_workers() >= 1);
        let config = PipelineConfig::new("raw", "results").with_stat_workers(0);
        assert_eq!(config.stat_workers, 1);
    }
}
