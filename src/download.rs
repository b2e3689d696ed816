//! Download coordinator — fetches dataset archives with bounded concurrency
//!
//! Descriptors are dispatched to spawned tasks gated by a semaphore sized
//! to the configured parallelism, so at most `P` fetches are in flight at
//! once. Each descriptor gets its own retry budget; exhausting it records
//! a permanent failure for that descriptor without aborting the run. A
//! successful fetch is appended to the resume ledger before its outcome is
//! surfaced, so an interrupted run loses at most the in-flight batch.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::resume::ResumeLedger;
use crate::types::{DatasetDescriptor, DownloadOutcome, DownloadStatus, RunStats};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fetches each descriptor's archive with bounded concurrency and
/// per-item retry, persisting successes to the resume ledger
pub struct DownloadCoordinator {
    client: reqwest::Client,
    config: Config,
    ledger: Arc<ResumeLedger>,
    stats: Arc<RunStats>,
    cancel: CancellationToken,
}

impl DownloadCoordinator {
    /// Create a coordinator sharing the run's client, ledger and stats
    pub fn new(
        client: reqwest::Client,
        config: Config,
        ledger: Arc<ResumeLedger>,
        stats: Arc<RunStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            config,
            ledger,
            stats,
            cancel,
        }
    }

    /// Download every descriptor's archive into `download_dir`
    ///
    /// Returns one [`DownloadOutcome`] per descriptor that ran to a
    /// terminal state. Outcomes complete in arbitrary order relative to
    /// the input; descriptors never dequeued because of cancellation
    /// produce no outcome. In dry-run mode no network or file I/O happens
    /// at all and the would-be action count is only logged.
    pub async fn download_all(
        &self,
        descriptors: Vec<DatasetDescriptor>,
        download_dir: &Path,
    ) -> Result<Vec<DownloadOutcome>> {
        if self.config.dry_run {
            info!(count = descriptors.len(), "dry run: would download datasets");
            return Ok(Vec::new());
        }

        info!(count = descriptors.len(), "downloading datasets");
        tokio::fs::create_dir_all(download_dir).await?;

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let mut tasks = JoinSet::new();

        for descriptor in descriptors {
            if self.cancel.is_cancelled() {
                warn!("cancellation requested, not dequeuing further datasets");
                break;
            }

            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
                _ = self.cancel.cancelled() => {
                    warn!("cancellation requested while waiting for a download slot");
                    break;
                }
            };

            let client = self.client.clone();
            let retry = self.config.retry.clone();
            let ledger = Arc::clone(&self.ledger);
            let stats = Arc::clone(&self.stats);
            let cancel = self.cancel.clone();
            let dest = download_dir.join(&descriptor.derived_name);

            tasks.spawn(async move {
                let _permit = permit;
                fetch_task(client, retry, descriptor, dest, ledger, stats, cancel).await
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {} // cancelled in flight, no terminal state reached
                Err(e) => warn!(error = %e, "download task panicked or was aborted"),
            }
        }

        info!(
            downloaded = self.stats.downloaded.load(Ordering::Relaxed),
            failed = self.stats.failed.load(Ordering::Relaxed),
            "downloads completed"
        );
        Ok(outcomes)
    }
}

/// Run one descriptor's retry loop to a terminal outcome
async fn fetch_task(
    client: reqwest::Client,
    retry: crate::config::RetryPolicy,
    descriptor: DatasetDescriptor,
    dest: PathBuf,
    ledger: Arc<ResumeLedger>,
    stats: Arc<RunStats>,
    cancel: CancellationToken,
) -> Option<DownloadOutcome> {
    let url = descriptor.url.clone();
    let attempt_dest = dest.clone();

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(url, "fetch cancelled in flight");
            remove_partial(&dest).await;
            return None;
        }
        result = crate::retry::with_backoff(&retry, || {
            fetch_archive(&client, &url, &attempt_dest)
        }) => result,
    };

    match result {
        Ok(((), attempts)) => {
            // Ledger append comes before the outcome is surfaced: a crash
            // after this point costs nothing on resume.
            if let Err(e) = ledger.record(&descriptor.url).await {
                warn!(url = descriptor.url, error = %e, "failed to record URL in resume ledger");
            }
            stats.downloaded.fetch_add(1, Ordering::Relaxed);
            debug!(url = descriptor.url, attempts, "dataset downloaded");
            Some(DownloadOutcome {
                descriptor,
                local_path: Some(dest),
                attempts,
                status: DownloadStatus::Success,
            })
        }
        Err((e, attempts)) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            warn!(url = descriptor.url, attempts, error = %e, "dataset permanently failed");
            remove_partial(&dest).await;
            Some(DownloadOutcome {
                descriptor,
                local_path: None,
                attempts,
                status: DownloadStatus::PermanentFailure,
            })
        }
    }
}

/// One fetch attempt: stream the response body to `dest`
///
/// The per-fetch timeout is enforced by the client itself. A failed
/// attempt removes whatever partial file it wrote.
async fn fetch_archive(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let run = async {
        let mut response = client.get(url).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok::<_, Error>(())
    };

    match run.await {
        Ok(()) => Ok(()),
        Err(e) => {
            remove_partial(dest).await;
            Err(e)
        }
    }
}

/// Best-effort removal of a partially written archive
async fn remove_partial(dest: &Path) {
    if let Err(e) = tokio::fs::remove_file(dest).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %dest.display(), error = %e, "could not remove partial file");
        }
    }
}
