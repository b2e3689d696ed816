//! Resume ledger: durable record of successfully fetched URLs
//!
//! The ledger is a newline-delimited, append-only file of exact URL
//! strings. Appends are serialized behind a mutex and flushed to disk
//! before the caller proceeds, so an interrupted run loses at most the
//! downloads that were still in flight. A URL may appear twice if a run
//! dies mid-write and repeats the download; duplicates are harmless on
//! load. A changed manifest entry pointing at the *same* URL is treated
//! as already fetched — the ledger compares literal URL strings only.

use crate::error::Result;
use crate::types::DatasetDescriptor;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// File name of the ledger inside the output directory
pub const LEDGER_FILENAME: &str = "downloaded_urls.txt";

/// Append-only set of previously fetched URLs, persisted across runs
#[derive(Debug)]
pub struct ResumeLedger {
    path: PathBuf,
    seen: HashSet<String>,
    writer: Mutex<File>,
}

impl ResumeLedger {
    /// Open (creating if absent) the ledger at `path` and load its URL set
    pub fn open(path: &Path) -> Result<Self> {
        let seen: HashSet<String> = match std::fs::read_to_string(path) {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };

        let writer = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), known = seen.len(), "resume ledger opened");

        Ok(Self {
            path: path.to_path_buf(),
            seen,
            writer: Mutex::new(writer),
        })
    }

    /// Path of the underlying ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of URLs recorded before this run
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the ledger held no URLs at open time
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Whether `url` was recorded as fetched by a previous run
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Drop descriptors already recorded as fetched, preserving order
    ///
    /// Pure over the set loaded at open time; URLs recorded during the
    /// current run do not affect it.
    pub fn filter(&self, descriptors: Vec<DatasetDescriptor>) -> Vec<DatasetDescriptor> {
        let before = descriptors.len();
        let remaining: Vec<_> = descriptors
            .into_iter()
            .filter(|d| !self.seen.contains(&d.url))
            .collect();
        if remaining.len() < before {
            info!(
                skipped = before - remaining.len(),
                remaining = remaining.len(),
                "resuming: previously fetched datasets skipped"
            );
        }
        remaining
    }

    /// Durably record `url` as successfully fetched
    ///
    /// Serialized by an internal mutex (single-writer discipline) and
    /// flushed plus synced before returning, so a recorded URL survives a
    /// crash immediately afterwards.
    pub async fn record(&self, url: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writeln!(writer, "{url}")?;
        writer.flush()?;
        writer.sync_data()?;
        debug!(url, "recorded in resume ledger");
        Ok(())
    }
}
