//! Typed readers for the raw tables.

use std::path::Path;

use crate::error::ExtractionError;
use crate::schema::{RawTable, DELIMITER};
use crate::types::{ChangeStatRecord, CommitRecord, MergeRecord, MessageRecord};
use crate::utils::delimited;

fn malformed(
    table: RawTable,
    dir: &Path,
    line_number: usize,
    reason: impl Into<String>,
) -> ExtractionError {
    ExtractionError::MalformedRow {
        path: table.path_in(dir),
        line_number,
        reason: reason.into(),
    }
}

fn data_lines(table: RawTable, dir: &Path) -> Result<Vec<String>, ExtractionError> {
    delimited::read_table(&table.path_in(dir), table.header())
}

pub fn commit_hashes(dir: &Path) -> Result<Vec<String>, ExtractionError> {
    data_lines(RawTable::CommitHashes, dir)
}

pub fn commits_info(dir: &Path) -> Result<Vec<CommitRecord>, ExtractionError> {
    let table = RawTable::CommitsInfo;
    let lines = data_lines(table, dir)?;
    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        // Header is line 1, data starts at line 2.
        let line_number = idx + 2;
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        let &[hash, author_email, author_name, unix, committer_email, committer_name] =
            fields.as_slice()
        else {
            return Err(malformed(
                table,
                dir,
                line_number,
                format!("expected 6 fields, found {}", fields.len()),
            ));
        };
        let commit_unix_time = unix.parse::<i64>().map_err(|_| {
            malformed(table, dir, line_number, format!("bad timestamp '{unix}'"))
        })?;
        records.push(CommitRecord {
            commit_hash: hash.to_owned(),
            author_email: author_email.to_owned(),
            author_name: author_name.to_owned(),
            commit_unix_time,
            committer_email: committer_email.to_owned(),
            committer_name: committer_name.to_owned(),
        });
    }
    Ok(records)
}

pub fn merges_info(dir: &Path) -> Result<Vec<MergeRecord>, ExtractionError> {
    let table = RawTable::MergesInfo;
    let lines = data_lines(table, dir)?;
    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 2;
        let &[hash, unix] = line.split(DELIMITER).collect::<Vec<_>>().as_slice() else {
            return Err(malformed(table, dir, line_number, "expected 2 fields"));
        };
        let merge_unix_time = unix.parse::<i64>().map_err(|_| {
            malformed(table, dir, line_number, format!("bad timestamp '{unix}'"))
        })?;
        records.push(MergeRecord {
            merge_hash: hash.to_owned(),
            merge_unix_time,
        });
    }
    Ok(records)
}

pub fn commits_messages(dir: &Path) -> Result<Vec<MessageRecord>, ExtractionError> {
    let lines = data_lines(RawTable::CommitsMessages, dir)?;
    Ok(lines
        .iter()
        .map(|line| {
            let (hash, message) = line.split_once(DELIMITER).unwrap_or((line.as_str(), ""));
            MessageRecord {
                commit_hash: hash.to_owned(),
                commit_message: message.to_owned(),
            }
        })
        .collect())
}

pub fn change_stats(dir: &Path) -> Result<Vec<ChangeStatRecord>, ExtractionError> {
    let table = RawTable::InsertionsDeletions;
    let lines = data_lines(table, dir)?;
    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 2;
        let &[hash, insertions, deletions] = line.split(DELIMITER).collect::<Vec<_>>().as_slice()
        else {
            return Err(malformed(table, dir, line_number, "expected 3 fields"));
        };
        let parse = |value: &str| {
            value.parse::<u64>().map_err(|_| {
                malformed(table, dir, line_number, format!("bad count '{value}'"))
            })
        };
        records.push(ChangeStatRecord {
            commit_hash: hash.to_owned(),
            insertions: parse(insertions)?,
            deletions: parse(deletions)?,
        });
    }
    Ok(records)
}
