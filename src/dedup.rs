//! Deduplication engine — multiset-to-set reduction over all records
//!
//! Consumes every validated line across all extracted files and produces
//! the final [`RecordSet`]: sorted in lexicographic byte order and, when
//! deduplication is enabled, unique under exact string equality. With
//! deduplication disabled the engine still sorts so output ordering stays
//! deterministic, but duplicates are retained and the removed-count is
//! reported as zero by choice, not as an estimate.

use crate::report::RecordSet;
use crate::types::RunStats;
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

/// Reduce the full line corpus to the final record set
pub fn consolidate(lines: Vec<String>, deduplicate: bool, stats: &RunStats) -> RecordSet {
    let input_count = lines.len() as u64;
    if input_count == 0 {
        warn!("no records collected; the record set is empty");
    }

    let records: Vec<String> = if deduplicate {
        // BTreeSet gives the set reduction and the byte-order sort in one
        let set: BTreeSet<String> = lines.into_iter().collect();
        set.into_iter().collect()
    } else {
        let mut all = lines;
        all.sort();
        all
    };

    let total = records.len() as u64;
    let removed = if deduplicate { input_count - total } else { 0 };
    stats.total_records.store(total, Ordering::Relaxed);
    stats.duplicates_removed.store(removed, Ordering::Relaxed);

    info!(
        input = input_count,
        unique = total,
        duplicates_removed = removed,
        "records consolidated"
    );
    RecordSet::new(records)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicates_collapse_and_counts_balance() {
        let stats = RunStats::new();
        let input = lines(&["b.com", "a.com", "b.com", "c.io", "a.com", "a.com"]);
        let input_len = input.len() as u64;

        let set = consolidate(input, true, &stats);

        assert_eq!(set.records(), &["a.com", "b.com", "c.io"]);
        let total = stats.total_records.load(Ordering::Relaxed);
        let removed = stats.duplicates_removed.load(Ordering::Relaxed);
        assert_eq!(total, 3);
        assert_eq!(removed, 3);
        assert_eq!(removed + total, input_len, "counts must balance exactly");
    }

    #[test]
    fn deduplication_is_case_sensitive_exact_match() {
        let stats = RunStats::new();
        let set = consolidate(lines(&["A.com", "a.com"]), true, &stats);
        assert_eq!(set.records().len(), 2, "differing case means differing records");
    }

    #[test]
    fn output_is_sorted_in_byte_order() {
        let stats = RunStats::new();
        let set = consolidate(lines(&["b.com", "B.com", "a.com"]), true, &stats);
        // Uppercase sorts before lowercase in byte order
        assert_eq!(set.records(), &["B.com", "a.com", "b.com"]);
    }

    #[test]
    fn consolidation_is_idempotent() {
        let stats = RunStats::new();
        let first = consolidate(lines(&["b.com", "a.com", "b.com"]), true, &stats);

        let stats2 = RunStats::new();
        let second = consolidate(first.records().to_vec(), true, &stats2);

        assert_eq!(first.records(), second.records(), "fixed point on own output");
        assert_eq!(stats2.duplicates_removed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn disabled_dedup_sorts_but_keeps_duplicates() {
        let stats = RunStats::new();
        let set = consolidate(lines(&["b.com", "a.com", "b.com"]), false, &stats);

        assert_eq!(set.records(), &["a.com", "b.com", "b.com"]);
        assert_eq!(stats.total_records.load(Ordering::Relaxed), 3);
        assert_eq!(
            stats.duplicates_removed.load(Ordering::Relaxed),
            0,
            "duplicate counting is skipped when dedup is off"
        );
    }

    #[test]
    fn empty_corpus_yields_empty_set_without_error() {
        let stats = RunStats::new();
        let set = consolidate(Vec::new(), true, &stats);
        assert!(set.is_empty());
        assert_eq!(stats.total_records.load(Ordering::Relaxed), 0);
        assert_eq!(stats.duplicates_removed.load(Ordering::Relaxed), 0);
    }
}
