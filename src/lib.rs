//! # chaos-collector
//!
//! Library for aggregating many remotely-hosted domain dataset archives,
//! referenced by a central JSON index, into a single deduplicated and
//! validated record set with frequency/pattern reports.
//!
//! ## Design Philosophy
//!
//! chaos-collector is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Crash-safe** - Successful downloads are persisted to an append-only
//!   resume ledger before anything else happens, so an interrupted run
//!   resumes where it left off
//! - **Failure-isolating** - A single broken dataset or archive is
//!   recorded and skipped; only an unusable index aborts a run
//!
//! ## Quick Start
//!
//! ```no_run
//! use chaos_collector::{ChaosCollector, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "./chaos_data".into(),
//!         parallelism: 8,
//!         resume: true,
//!         ..Default::default()
//!     };
//!
//!     let collector = ChaosCollector::new(config)?;
//!
//!     // Hook the cancellation token to Ctrl+C for a resumable interrupt
//!     let cancel = collector.cancellation_token();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         cancel.cancel();
//!     });
//!
//!     let report = collector.run().await?;
//!     println!(
//!         "{} records ({} duplicates removed, {} datasets failed)",
//!         report.stats.total_records,
//!         report.stats.duplicates_removed,
//!         report.stats.failed,
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Collection run orchestration
pub mod collector;
/// Configuration types
pub mod config;
/// Deduplication engine
pub mod dedup;
/// Download coordination with bounded concurrency
pub mod download;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Index fetching and manifest parsing
pub mod index;
/// Record set and report derivations
pub mod report;
/// Resume ledger persistence
pub mod resume;
/// Retry logic with growing backoff
pub mod retry;
/// Core data types
pub mod types;
/// Record validation
pub mod validate;

pub use collector::{ChaosCollector, CollectionReport};
pub use config::{Config, RetryPolicy};
pub use error::{Error, Result};
pub use report::RecordSet;
pub use types::{
    DatasetDescriptor, DownloadOutcome, DownloadStatus, ExtractedFile, RunStats, StatsSnapshot,
};
pub use validate::DomainValidator;
