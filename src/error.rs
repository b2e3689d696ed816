//! Error types for chaos-collector
//!
//! The taxonomy mirrors how failures propagate through the pipeline:
//! - [`Error::Fetch`] is transient and retried up to the configured budget
//! - [`Error::Format`] means the manifest is unusable and aborts the run
//!   before any download begins
//! - [`Error::Extraction`] is scoped to a single archive and never aborts
//!   the run; the extraction loop logs it and moves on
//!
//! Validation failures are not represented here at all: malformed records
//! are filtered silently, never raised.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chaos-collector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chaos-collector
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "parallelism")
        key: Option<String>,
    },

    /// Network error while fetching the index or a dataset archive
    #[error("fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The index manifest is not parseable or yields zero descriptors
    #[error("index format error: {0}")]
    Format(String),

    /// A single archive failed to extract
    #[error("extraction error for {archive}: {reason}")]
    Extraction {
        /// Path to the archive that failed to extract
        archive: PathBuf,
        /// Why extraction failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown requested before the run started
    #[error("shutdown in progress: not starting a new collection run")]
    ShuttingDown,
}
