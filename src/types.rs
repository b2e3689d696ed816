//! Core data types shared across the pipeline stages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// One manifest entry identifying a single downloadable dataset archive
///
/// Immutable once created by the index fetcher; its `url` is the identity
/// used by the resume ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Source URL of the archive
    pub url: String,
    /// Local file name derived from the URL path
    pub derived_name: String,
}

/// Terminal status of one descriptor's download
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// The archive was fetched and its URL recorded in the ledger
    Success,
    /// Every attempt in the retry budget failed; not re-queued this run
    PermanentFailure,
}

/// Terminal result of attempting to fetch one descriptor
///
/// Created once when the retry loop finishes and never mutated afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// The descriptor this outcome belongs to
    pub descriptor: DatasetDescriptor,
    /// Where the archive landed on disk (`None` on failure)
    pub local_path: Option<PathBuf>,
    /// How many fetch attempts were made
    pub attempts: u32,
    /// Terminal status
    pub status: DownloadStatus,
}

/// A regular file produced by extracting one archive
///
/// Scratch-lifetime only: the file lives under the run's extraction root
/// and is deleted with it when the pipeline finishes.
#[derive(Clone, Debug)]
pub struct ExtractedFile {
    /// Archive this file came out of
    pub source_archive: PathBuf,
    /// Path of the extracted file on disk
    pub path: PathBuf,
}

/// Shared statistics accumulator for one collection run
///
/// Counters are atomic so download workers can bump them without any
/// ordering requirement on completion; every other stage runs
/// single-threaded. Take a [`snapshot`](RunStats::snapshot) after the
/// pipeline finishes for a plain serializable view.
#[derive(Debug)]
pub struct RunStats {
    /// Descriptors found in the index (before resume filtering)
    pub total_descriptors: AtomicU64,
    /// Archives downloaded successfully
    pub downloaded: AtomicU64,
    /// Descriptors that exhausted their retry budget
    pub failed: AtomicU64,
    /// Archives extracted successfully
    pub extracted: AtomicU64,
    /// Records in the final output
    pub total_records: AtomicU64,
    /// Input lines collapsed by deduplication
    pub duplicates_removed: AtomicU64,
    started: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Create a new accumulator; the duration clock starts now
    pub fn new() -> Self {
        Self {
            total_descriptors: AtomicU64::new(0),
            downloaded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            extracted: AtomicU64::new(0),
            total_records: AtomicU64::new(0),
            duplicates_removed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Freeze the counters into a plain serializable snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            collection_date: Utc::now(),
            total_descriptors: self.total_descriptors.load(Ordering::Relaxed),
            downloaded: self.downloaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            extracted: self.extracted.load(Ordering::Relaxed),
            total_records: self.total_records.load(Ordering::Relaxed),
            duplicates_removed: self.duplicates_removed.load(Ordering::Relaxed),
            duration_seconds: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// Read-only view of [`RunStats`] after pipeline completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// When the snapshot was taken
    pub collection_date: DateTime<Utc>,
    /// Descriptors found in the index (before resume filtering)
    pub total_descriptors: u64,
    /// Archives downloaded successfully
    pub downloaded: u64,
    /// Descriptors that exhausted their retry budget
    pub failed: u64,
    /// Archives extracted successfully
    pub extracted: u64,
    /// Records in the final output
    pub total_records: u64,
    /// Input lines collapsed by deduplication
    pub duplicates_removed: u64,
    /// Wall-clock duration of the run so far
    pub duration_seconds: f64,
}
