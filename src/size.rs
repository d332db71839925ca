//! Folder size calculation.

use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// Total size in bytes of every regular file beneath `folder`.
///
/// Symbolic links are not followed and entries that can't be read are
/// skipped with a warning.
pub fn folder_size(folder: &Path) -> u64 {
    let mut total = 0u64;

    for entry in WalkDir::new(folder).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Could not read entry in {}: {}", folder.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => total += metadata.len(),
            Err(err) => warn!(
                "Could not get file size for file {}: {}",
                entry.path().display(),
                err
            ),
        }
    }

    total
}
