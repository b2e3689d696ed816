//! Collection run orchestration
//!
//! Wires the pipeline stages strictly left to right: index fetch →
//! resume filter → download → extract → validate → dedup → reports.
//! Fatal conditions (unreachable or unparseable index, zero descriptors)
//! abort the run before any output file is written; per-dataset failures
//! are confined to their outcome and never produce an `Err`.

use crate::config::Config;
use crate::dedup;
use crate::download::DownloadCoordinator;
use crate::error::{Error, Result};
use crate::extraction;
use crate::index;
use crate::report::{
    self, DOMAIN_DISTRIBUTION_FILENAME, RecordSet, SUMMARY_FILENAME, TLD_DISTRIBUTION_FILENAME,
    WILDCARD_PATTERNS_FILENAME,
};
use crate::resume::{LEDGER_FILENAME, ResumeLedger};
use crate::types::{DownloadOutcome, RunStats, StatsSnapshot};
use crate::validate::{self, DomainValidator};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything a run produces for the embedding application
#[derive(Clone, Debug)]
pub struct CollectionReport {
    /// Final deduplicated, sorted record set (empty on dry runs)
    pub records: RecordSet,
    /// Frozen run statistics
    pub stats: StatsSnapshot,
    /// Terminal outcome per descriptor that ran to completion
    pub outcomes: Vec<DownloadOutcome>,
}

/// Aggregates remotely-hosted dataset archives into one validated,
/// deduplicated record set
///
/// Construct with a validated [`Config`], then drive a single
/// [`run`](ChaosCollector::run). Interrupt handling is cooperative:
/// cancel the token from [`cancellation_token`](Self::cancellation_token)
/// and the run stops dequeuing work, finishes or abandons what is in
/// flight, and leaves the resume ledger intact.
#[derive(Debug)]
pub struct ChaosCollector {
    config: Config,
    client: reqwest::Client,
    stats: Arc<RunStats>,
    cancel: CancellationToken,
}

impl ChaosCollector {
    /// Validate the configuration and build the shared HTTP client
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            config,
            client,
            stats: Arc::new(RunStats::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Token an embedding application can cancel to interrupt the run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The configuration this collector was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current statistics snapshot (counters so far)
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Execute one collection run end to end
    ///
    /// Dry runs fetch and parse the index, log the would-be download
    /// count, and return an empty report without touching the network
    /// for datasets or writing any file.
    pub async fn run(&self) -> Result<CollectionReport> {
        if self.cancel.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let descriptors =
            index::fetch_index(&self.client, &self.config.index_url, &self.config.retry).await?;
        self.stats
            .total_descriptors
            .store(descriptors.len() as u64, Ordering::Relaxed);

        if self.config.dry_run {
            info!(
                count = descriptors.len(),
                "dry run: index holds this many datasets, stopping before download"
            );
            return Ok(CollectionReport {
                records: RecordSet::new(Vec::new()),
                stats: self.stats.snapshot(),
                outcomes: Vec::new(),
            });
        }

        // The ledger (an output file) is only created once the index is
        // known good, so fatal index errors leave the output dir untouched.
        std::fs::create_dir_all(&self.config.output_dir)?;
        let ledger = Arc::new(ResumeLedger::open(
            &self.config.output_dir.join(LEDGER_FILENAME),
        )?);

        let descriptors = if self.config.resume {
            ledger.filter(descriptors)
        } else {
            descriptors
        };

        let scratch = self.config.output_dir.join("scratch");
        let download_dir = scratch.join("downloads");
        let extract_dir = scratch.join("extracted");

        let coordinator = DownloadCoordinator::new(
            self.client.clone(),
            self.config.clone(),
            Arc::clone(&ledger),
            Arc::clone(&self.stats),
            self.cancel.clone(),
        );
        let outcomes = coordinator.download_all(descriptors, &download_dir).await?;

        let extracted = extraction::extract_archives(&download_dir, &extract_dir, &self.stats)?;

        let validator = self.config.validate_records.then(DomainValidator::new);
        let mut lines = Vec::new();
        for file in &extracted {
            lines.extend(validate::read_file_records(&file.path, validator.as_ref()));
        }

        let records = dedup::consolidate(lines, self.config.deduplicate, &self.stats);

        self.write_reports(&records)?;
        self.cleanup_scratch(&scratch);

        let stats = self.stats.snapshot();
        info!(
            total_records = stats.total_records,
            downloaded = stats.downloaded,
            failed = stats.failed,
            duration_seconds = stats.duration_seconds,
            "collection run finished"
        );
        Ok(CollectionReport {
            records,
            stats,
            outcomes,
        })
    }

    /// Write the record list, distributions, patterns and JSON summary
    fn write_reports(&self, records: &RecordSet) -> Result<()> {
        let out = &self.config.output_dir;
        let records_path = out.join(&self.config.output_file);

        records.write_records(&records_path)?;
        report::write_distribution(
            &out.join(TLD_DISTRIBUTION_FILENAME),
            &records.tld_distribution(),
        )?;
        report::write_distribution(
            &out.join(DOMAIN_DISTRIBUTION_FILENAME),
            &records.base_distribution(),
        )?;
        report::write_patterns(
            &out.join(WILDCARD_PATTERNS_FILENAME),
            &records.wildcard_patterns(),
        )?;
        report::write_summary(&out.join(SUMMARY_FILENAME), &self.stats.snapshot(), &records_path)?;

        info!(dir = %out.display(), "reports written");
        Ok(())
    }

    /// Remove the scratch tree unless the configuration keeps it
    fn cleanup_scratch(&self, scratch: &std::path::Path) {
        if self.config.keep_scratch {
            info!(dir = %scratch.display(), "keeping scratch directory");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(scratch) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %scratch.display(), error = %e, "failed to remove scratch directory");
            }
        }
    }
}
