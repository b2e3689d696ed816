//! Index fetching and manifest parsing
//!
//! The index is a JSON array of dataset descriptions. Each entry with a
//! present, non-empty `URL` field yields one [`DatasetDescriptor`];
//! entries without one are silently skipped. An empty descriptor list
//! after filtering means the remote source broke its contract and is
//! fatal, unlike a per-dataset failure later in the run.

use crate::config::RetryPolicy;
use crate::error::{Error, Result};
use crate::types::DatasetDescriptor;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// One raw manifest entry; only the URL field matters to the pipeline
#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(rename = "URL", default)]
    url: Option<String>,
}

/// Fetch the manifest and turn it into an ordered descriptor list
///
/// The HTTP fetch runs through the retry policy; exhausting it is fatal
/// for the whole run. A body that is not a JSON array of objects, or one
/// that yields zero descriptors, fails with [`Error::Format`].
pub async fn fetch_index(
    client: &reqwest::Client,
    index_url: &str,
    retry: &RetryPolicy,
) -> Result<Vec<DatasetDescriptor>> {
    info!(url = index_url, "downloading dataset index");

    let body = crate::retry::with_backoff(retry, || async {
        let response = client.get(index_url).send().await?.error_for_status()?;
        response.text().await
    })
    .await
    .map(|(body, _)| body)
    .map_err(|(e, attempts)| {
        warn!(attempts, "index fetch exhausted its retry budget");
        Error::Fetch(e)
    })?;

    let descriptors = parse_index(&body)?;
    info!(count = descriptors.len(), "index parsed");
    Ok(descriptors)
}

/// Parse a manifest body into descriptors, preserving entry order
pub fn parse_index(body: &str) -> Result<Vec<DatasetDescriptor>> {
    let entries: Vec<IndexEntry> = serde_json::from_str(body)
        .map_err(|e| Error::Format(format!("index is not a JSON array of objects: {e}")))?;

    let total = entries.len();
    let mut descriptors = Vec::new();
    let mut used_names = HashSet::new();

    for (position, entry) in entries.into_iter().enumerate() {
        let Some(url) = entry.url.filter(|u| !u.is_empty()) else {
            debug!(position, "skipping index entry without a URL");
            continue;
        };

        let name = derive_name(&url).unwrap_or_else(|| "dataset.zip".to_string());
        // Two URLs can share a file name; a positional prefix keeps the
        // download directory collision-free without losing the extension.
        let derived_name = if used_names.insert(name.clone()) {
            name
        } else {
            format!("{position}-{name}")
        };

        descriptors.push(DatasetDescriptor { url, derived_name });
    }

    if descriptors.is_empty() {
        return Err(Error::Format(format!(
            "index contained {total} entries but none with a usable URL"
        )));
    }

    Ok(descriptors)
}

/// Derive a local file name from the final path segment of the URL
fn derive_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    Some(segment.to_string())
}
