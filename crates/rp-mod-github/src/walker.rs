//! Breadth-first enumeration of a remote directory.

use std::collections::VecDeque;

use rp_base::HostError;
use rp_base::types::{Contents, RemoteEntry};

use crate::host::RepoHost;

/// Return `root` plus every descendant, in breadth-first discovery order.
///
/// A file root yields just `[root]`. Any failed listing aborts the whole walk.
pub fn walk(host: &dyn RepoHost, repo: &str, root: &RemoteEntry) -> Result<Vec<RemoteEntry>, HostError> {
    if !root.is_dir() {
        return Ok(vec![root.clone()]);
    }
    let first = list_dir(host, repo, &root.path)?;
    walk_from(host, repo, root, first)
}

fn walk_from(
    host: &dyn RepoHost,
    repo: &str,
    root: &RemoteEntry,
    first_listing: Vec<RemoteEntry>,
) -> Result<Vec<RemoteEntry>, HostError> {
    let mut out = vec![root.clone()];
    if !root.is_dir() {
        return Ok(out);
    }

    let mut queue: VecDeque<Vec<RemoteEntry>> = VecDeque::new();
    queue.push_back(first_listing);
    while let Some(listing) = queue.pop_front() {
        for entry in listing {
            if entry.is_dir() {
                queue.push_back(list_dir(host, repo, &entry.path)?);
            }
            out.push(entry);
        }
    }
    Ok(out)
}

/// List a directory; a path that turned out to be a file lists as itself.
fn list_dir(host: &dyn RepoHost, repo: &str, path: &str) -> Result<Vec<RemoteEntry>, HostError> {
    match host.get_contents(repo, path)? {
        Contents::Directory(entries) => Ok(entries),
        Contents::File(file) => Ok(vec![file.entry]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use rp_base::ErrorKind;

    fn fixture() -> MemoryHost {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "a/b.txt", b"b");
        host.seed_file("user/r", "a/c/d.txt", b"d");
        host.seed_file("user/r", "e.txt", b"e");
        host
    }

    #[test]
    fn walk_is_breadth_first() {
        let host = fixture();
        let root = RemoteEntry::directory("", "root");
        let paths: Vec<String> = walk(&host, "user/r", &root).unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["", "a", "e.txt", "a/c", "a/b.txt", "a/c/d.txt"]);
    }

    #[test]
    fn file_root_yields_itself() {
        let host = fixture();
        let root = RemoteEntry::file("e.txt", 1, "s");
        assert_eq!(walk(&host, "user/r", &root).unwrap(), vec![root]);
    }

    #[test]
    fn failed_listing_aborts_walk() {
        let host = fixture();
        host.inject_failure("user/r", "a/c", ErrorKind::Transport);
        let root = RemoteEntry::directory("a", "s");
        let err = walk(&host, "user/r", &root).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
