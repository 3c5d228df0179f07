//! Commit message tokenization and word frequency tables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use tracing::info;

use crate::error::ExtractionError;
use crate::tables::load;
use crate::types::{WordFrequencyRow, WordPairRow};
use crate::utils::delimited;

/// Tokens must be strictly longer than this many characters, after
/// cleaning, to survive.
const SHORT_WORD_CUTOFF: usize = 3;

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Lowercase a raw token and drop every character outside a-z.
/// Punctuation and digits are removed in place, not by rejecting the
/// token: "don't" becomes "dont", "v2.0" becomes "v".
pub fn clean_token(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect()
}

/// Split a message into surviving (raw, stemmed) token pairs. The steps
/// run in a fixed order: lowercase, strip non-letters, filter by length,
/// stem; stemming an uncleaned token would change the results.
pub fn tokenize(message: &str) -> Vec<(String, String)> {
    message
        .split_whitespace()
        .map(clean_token)
        .filter(|token| token.len() > SHORT_WORD_CUTOFF)
        .map(|token| {
            let stemmed = STEMMER.stem(&token).into_owned();
            (token, stemmed)
        })
        .collect()
}

/// The three word-level outputs derived from commit messages.
pub struct MessageStats {
    /// One row per surviving (raw, stemmed) pair, in message order.
    pub all_words: Vec<WordPairRow>,
    pub raw_frequencies: Vec<WordFrequencyRow>,
    pub stemmed_frequencies: Vec<WordFrequencyRow>,
}

/// Derives word statistics from the extracted messages table.
pub struct MessageStatsBuilder {
    raw_dir: PathBuf,
}

impl MessageStatsBuilder {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn build(&self) -> Result<MessageStats, ExtractionError> {
        let messages = load::commits_messages(&self.raw_dir)?;
        let stats = count_words(messages.iter().map(|m| m.commit_message.as_str()));
        info!(
            pairs = stats.all_words.len(),
            raw = stats.raw_frequencies.len(),
            stemmed = stats.stemmed_frequencies.len(),
            "tokenized commit messages"
        );
        Ok(stats)
    }
}

/// Explode messages into token pairs and aggregate occurrence counts by
/// raw and by stemmed token. Count maps are keyed alphabetically;
/// consumers re-sort by frequency anyway.
pub fn count_words<'a, I>(messages: I) -> MessageStats
where
    I: IntoIterator<Item = &'a str>,
{
    let mut all_words = Vec::new();
    let mut raw_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut stemmed_counts: BTreeMap<String, u64> = BTreeMap::new();

    for message in messages {
        for (raw, stemmed) in tokenize(message) {
            *raw_counts.entry(raw.clone()).or_insert(0) += 1;
            *stemmed_counts.entry(stemmed.clone()).or_insert(0) += 1;
            all_words.push(WordPairRow {
                raw_word: raw,
                stemmed_word: stemmed,
            });
        }
    }

    MessageStats {
        all_words,
        raw_frequencies: into_frequency_rows(raw_counts),
        stemmed_frequencies: into_frequency_rows(stemmed_counts),
    }
}

fn into_frequency_rows(counts: BTreeMap<String, u64>) -> Vec<WordFrequencyRow> {
    counts
        .into_iter()
        .map(|(word, occurrences)| WordFrequencyRow { word, occurrences })
        .collect()
}

/// Render (raw, stemmed) pair rows as delimited lines.
pub fn pair_lines(rows: &[WordPairRow]) -> Vec<String> {
    rows.iter()
        .map(|row| delimited::join_fields(&[row.raw_word.as_str(), row.stemmed_word.as_str()]))
        .collect()
}

/// Render frequency rows as delimited lines.
pub fn frequency_lines(rows: &[WordFrequencyRow]) -> Vec<String> {
    rows.iter()
        .map(|row| delimited::join_fields(&[row.word.clone(), row.occurrences.to_string()]))
        .collect()
}
