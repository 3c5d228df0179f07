//! Read/write helpers for the delimited table files.
//!
//! The format is positional: one header line, then one row per line,
//! fields joined with the separator and never quoted. Writers always
//! rewrite the whole file.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::ExtractionError;
use crate::schema::DELIMITER;

/// Join row fields with the table delimiter.
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| f.as_ref())
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// Rewrite a table file from scratch: one header line, then the rows.
pub fn write_table<I>(path: &Path, header: &[&str], rows: I) -> io::Result<()>
where
    I: IntoIterator<Item = String>,
{
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", join_fields(header))?;
    for row in rows {
        writeln!(out, "{row}")?;
    }
    out.flush()
}

/// Read a table's data lines, checking the header against the schema.
pub fn read_table(path: &Path, header: &[&str]) -> Result<Vec<String>, ExtractionError> {
    if !path.exists() {
        return Err(ExtractionError::MissingPrerequisite {
            path: path.to_path_buf(),
        });
    }

    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let first = lines.next().transpose()?.unwrap_or_default();
    let expected = join_fields(header);
    if first != expected {
        return Err(ExtractionError::MalformedRow {
            path: path.to_path_buf(),
            line_number: 1,
            reason: format!("expected header '{expected}', found '{first}'"),
        });
    }

    let mut rows = Vec::new();
    for line in lines {
        let line = line?;
        if !line.is_empty() {
            rows.push(line);
        }
    }
    Ok(rows)
}
