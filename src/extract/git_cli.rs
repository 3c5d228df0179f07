//! Structured invocation of the `git` binary.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::ExtractionError;

/// History filter for `git log` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFilter {
    /// Every non-merge commit reachable from any ref.
    NoMerges,
    /// Every merge commit reachable from any ref.
    MergesOnly,
}

impl LogFilter {
    fn flag(self) -> &'static str {
        match self {
            LogFilter::NoMerges => "--no-merges",
            LogFilter::MergesOnly => "--merges",
        }
    }
}

/// Runs git subcommands inside a repository checkout. Arguments are
/// always passed as a vector, never composed into a shell string.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Run `git` with the given arguments and return its stdout.
    pub async fn run(&self, args: &[&str]) -> Result<String, ExtractionError> {
        let output = Command::new("git")
            .current_dir(&self.repo_path)
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ExtractionError::GitCommand {
                args: args.iter().map(|a| a.to_string()).collect(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// All-refs history listing in the given pretty format.
    pub async fn log(&self, filter: LogFilter, format: &str) -> Result<String, ExtractionError> {
        let pretty = format!("--pretty=format:{format}");
        self.run(&["log", filter.flag(), "--all", &pretty]).await
    }

    /// Diff summary line of a commit against its first parent. Root
    /// commits have no parent, so the command fails for them; callers
    /// treat that as an empty diff.
    pub async fn shortstat(&self, hash: &str) -> Result<String, ExtractionError> {
        let parent = format!("{hash}~");
        self.run(&["diff", "--shortstat", &parent, hash]).await
    }
}
