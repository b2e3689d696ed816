//! Record set and report derivations
//!
//! The crate does not render tables or compress anything; it defines the
//! derivation rules consumed externally and writes the plain-text report
//! files. All derivations operate on the final record set, never on
//! intermediate pipeline state.

use crate::error::Result;
use crate::types::StatsSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// File name of the top-level-label distribution report
pub const TLD_DISTRIBUTION_FILENAME: &str = "tld_distribution.txt";
/// File name of the second-level distribution report
pub const DOMAIN_DISTRIBUTION_FILENAME: &str = "domain_distribution.txt";
/// File name of the wildcard pattern list
pub const WILDCARD_PATTERNS_FILENAME: &str = "wildcard_patterns.txt";
/// File name of the JSON run summary
pub const SUMMARY_FILENAME: &str = "collection_summary.json";

/// Final sorted collection of validated records
///
/// Unique under exact string equality when deduplication was enabled;
/// always sorted in lexicographic byte order either way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<String>,
}

impl RecordSet {
    /// Wrap an already consolidated, sorted record list
    pub(crate) fn new(records: Vec<String>) -> Self {
        Self { records }
    }

    /// The records, sorted
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Count records by their final dot-delimited label
    ///
    /// Sorted descending by count, ties broken by label for determinism.
    pub fn tld_distribution(&self) -> Vec<(String, u64)> {
        count_by(&self.records, top_level_label)
    }

    /// Count records by their last two labels
    pub fn base_distribution(&self) -> Vec<(String, u64)> {
        count_by(&self.records, base_domain)
    }

    /// Deduplicated, sorted `*.` + last-two-labels patterns
    pub fn wildcard_patterns(&self) -> Vec<String> {
        let patterns: std::collections::BTreeSet<String> = self
            .records
            .iter()
            .map(|r| format!("*.{}", base_domain(r)))
            .collect();
        patterns.into_iter().collect()
    }

    /// Write the newline-delimited record list to `path`
    pub fn write_records(&self, path: &Path) -> Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for record in &self.records {
            writeln!(file, "{record}")?;
        }
        file.flush()?;
        Ok(())
    }
}

/// The final dot-delimited label of a record
fn top_level_label(record: &str) -> &str {
    record.rsplit('.').next().unwrap_or(record)
}

/// The last two labels of a record (the record itself if it has fewer)
fn base_domain(record: &str) -> &str {
    match record.rmatch_indices('.').nth(1) {
        Some((idx, _)) => &record[idx + 1..],
        None => record,
    }
}

/// Count records by a label-deriving function, descending by count
fn count_by<'a>(records: &'a [String], derive: fn(&'a str) -> &'a str) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(derive(record)).or_insert(0) += 1;
    }
    let mut out: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Write a `count label` distribution file, count right-aligned
pub fn write_distribution(path: &Path, distribution: &[(String, u64)]) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for (label, count) in distribution {
        writeln!(file, "{count:8} {label}")?;
    }
    file.flush()?;
    Ok(())
}

/// Write a newline-delimited pattern list
pub fn write_patterns(path: &Path, patterns: &[String]) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for pattern in patterns {
        writeln!(file, "{pattern}")?;
    }
    file.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    stats: &'a StatsSnapshot,
    output_file: String,
    output_file_size: u64,
}

/// Write the JSON run summary next to the other reports
pub fn write_summary(path: &Path, stats: &StatsSnapshot, records_file: &Path) -> Result<()> {
    let output_file_size = std::fs::metadata(records_file).map(|m| m.len()).unwrap_or(0);
    let summary = Summary {
        stats,
        output_file: records_file.display().to_string(),
        output_file_size,
    };
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer_pretty(file, &summary)?;
    info!(path = %path.display(), "summary written");
    Ok(())
}
