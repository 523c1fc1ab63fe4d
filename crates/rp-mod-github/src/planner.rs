//! Deletion order for a recursive delete.

use std::collections::HashSet;

use rp_base::types::RemoteEntry;

/// Files to delete, in reverse lexicographic order of the full path. A child
/// path sorts after its parent's prefix, so every file under a directory goes
/// before anything that sorts below that directory.
///
/// Directories are dropped: the contents API has no directory object and a
/// directory disappears once its last file is gone.
pub fn plan_deletion_order(entries: &[RemoteEntry]) -> Vec<RemoteEntry> {
    let mut seen = HashSet::new();
    let mut files: Vec<RemoteEntry> =
        entries.iter().filter(|e| !e.is_dir() && seen.insert(e.path.as_str())).cloned().collect();
    files.sort_by(|a, b| b.path.cmp(&a.path));
    files
}
