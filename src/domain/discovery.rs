//! Scanning input directories for MLV files.

use crate::domain::jobs::CandidateFile;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Accepted input suffixes. Matching is literal, so `.Mlv` does not count.
pub const MLV_SUFFIXES: [&str; 2] = [".mlv", ".MLV"];

/// Matched on the raw name bytes, so names that are not UTF-8 still qualify.
pub fn is_mlv_name(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    MLV_SUFFIXES
        .iter()
        .any(|suffix| bytes.ends_with(suffix.as_bytes()))
}

/// File name with its `.mlv`/`.MLV` suffix removed.
pub fn base_name(name: &OsStr) -> OsString {
    if !is_mlv_name(name) {
        return name.to_owned();
    }
    // The suffix is the last extension, so the stem is everything before it.
    // A bare ".mlv" has no stem as far as `Path` is concerned.
    if MLV_SUFFIXES.iter().any(|suffix| name == OsStr::new(suffix)) {
        return OsString::new();
    }
    Path::new(name)
        .file_stem()
        .map(OsStr::to_owned)
        .unwrap_or_default()
}

/// List the MLV files directly inside `directory`.
///
/// Directories (including symlinks to them) are skipped, as are entries
/// that vanish before they can be stat'ed. An unreadable directory gives
/// an empty list. The order is whatever the filesystem returns.
pub async fn discover(directory: &Path) -> Vec<CandidateFile> {
    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Could not read directory {:?}: {}", directory, e);
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Stopped listing {:?}: {}", directory, e);
                break;
            }
        };

        let name = entry.file_name();
        if !is_mlv_name(&name) {
            continue;
        }

        // Follows symlinks, so a link to a directory is rejected here too.
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => {
                candidates.push(CandidateFile::new(directory, name));
            }
            Ok(_) => tracing::debug!("Skipping {:?} (not a regular file)", name),
            Err(e) => tracing::debug!("Skipping {:?}: {}", name, e),
        }
    }

    candidates
}
