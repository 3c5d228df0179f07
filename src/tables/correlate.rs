//! Nearest-subsequent-merge correlation.
//!
//! Each commit timestamp adopts the merge at the next timestamp greater
//! than or equal to it, the backward-fill half of a sorted-merge join.

use std::collections::BTreeMap;

use crate::types::MergeRecord;

/// Lookup table from commit timestamps to the nearest merge at or after
/// them.
pub struct MergeCorrelator {
    by_time: BTreeMap<i64, MergeRecord>,
}

impl MergeCorrelator {
    /// Build from merge records, deduplicating by timestamp. The first
    /// record seen for a timestamp wins, which keeps the mapping stable
    /// for a fixed input; only the timestamp takes part in matching.
    pub fn new(merges: &[MergeRecord]) -> Self {
        let mut by_time = BTreeMap::new();
        for merge in merges {
            by_time
                .entry(merge.merge_unix_time)
                .or_insert_with(|| merge.clone());
        }
        Self { by_time }
    }

    /// The merge with the smallest timestamp >= `commit_time`, or `None`
    /// when no merge follows the commit.
    pub fn nearest_at_or_after(&self, commit_time: i64) -> Option<&MergeRecord> {
        self.by_time.range(commit_time..).next().map(|(_, m)| m)
    }
}
