//! Archive extraction into per-archive namespaces
//!
//! Every downloaded ZIP extracts into its own directory keyed by the
//! archive's base name, so identically named files inside different
//! archives cannot collide. A broken archive is logged and skipped; it
//! never aborts extraction of the rest.

use crate::error::{Error, Result};
use crate::types::{ExtractedFile, RunStats};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extract every ZIP in `download_dir` and collect the resulting files
///
/// Returns the set of regular files found under the extraction roots.
/// Bumps `stats.extracted` once per successfully extracted archive.
pub fn extract_archives(
    download_dir: &Path,
    extract_dir: &Path,
    stats: &RunStats,
) -> Result<Vec<ExtractedFile>> {
    std::fs::create_dir_all(extract_dir)?;

    let archives = detect_zip_files(download_dir)?;
    info!(count = archives.len(), "extracting archives");

    let mut extracted_files = Vec::new();
    for archive in archives {
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());
        let target = extract_dir.join(&stem);

        match extract_zip(&archive, &target) {
            Ok(count) => {
                stats.extracted.fetch_add(1, Ordering::Relaxed);
                debug!(archive = %archive.display(), files = count, "archive extracted");
                collect_files(&archive, &target, &mut extracted_files);
            }
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "failed to extract archive, skipping");
            }
        }
    }

    info!(
        archives = stats.extracted.load(Ordering::Relaxed),
        files = extracted_files.len(),
        "extraction finished"
    );
    Ok(extracted_files)
}

/// List ZIP archives directly inside `dir` (non-recursive)
fn detect_zip_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        // Nothing downloaded means nothing to extract, not an error
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(archives),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        if let Some(ext) = path.extension() {
            if ext.to_string_lossy().eq_ignore_ascii_case("zip") {
                archives.push(path);
            }
        }
    }
    archives.sort();
    Ok(archives)
}

/// Extract one ZIP archive into `target`, returning the entry count written
fn extract_zip(archive_path: &Path, target: &Path) -> Result<usize> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::Extraction {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to open ZIP: {e}"),
    })?;

    std::fs::create_dir_all(target)?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| Error::Extraction {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP entry {index}: {e}"),
        })?;

        // Entries escaping the target directory are dropped outright
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(archive = %archive_path.display(), index, "skipping entry with unsafe path");
            continue;
        };
        let dest = target.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = std::fs::File::create(&dest)?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| Error::Extraction {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to write {}: {e}", dest.display()),
        })?;
        written += 1;
    }

    Ok(written)
}

/// Walk one archive's extraction root and collect its regular files
fn collect_files(archive: &Path, root: &Path, out: &mut Vec<ExtractedFile>) {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            out.push(ExtractedFile {
                source_archive: archive.to_path_buf(),
                path: entry.into_path(),
            });
        }
    }
}
