//! Multi-call operations built on [`RepoHost`]: recursive delete, uploads,
//! save, archive download and repository creation.
//!
//! Batches (recursive delete, folder upload) are best-effort. There is no
//! transaction: an abort leaves the items already processed as they are, and
//! the returned [`BatchError`] says how many completed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use rp_base::config::{CommitKind, commit_message};
use rp_base::types::{ArchiveFormat, Contents, FileContent, NewRepository, RemoteEntry, RepoSummary};
use rp_base::{BatchError, CancelToken, HostError, LogSink, paths};

use crate::host::RepoHost;
use crate::planner::plan_deletion_order;
use crate::walker::walk;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Created,
    Updated,
}

/// Delete a file, or every file below a directory, deepest first.
///
/// NotFound and Conflict on one item are logged and skipped. Any other error
/// stops the batch.
pub fn delete_path(
    host: &dyn RepoHost,
    repo: &str,
    target: &RemoteEntry,
    cancel: &CancelToken,
    log: &dyn LogSink,
) -> Result<DeleteReport, BatchError> {
    let entries = walk(host, repo, target).map_err(|source| BatchError::Aborted { completed: 0, source })?;
    let plan = plan_deletion_order(&entries);
    log.info(format!("Deleting {} file(s) under '{}'", plan.len(), display_path(&target.path)));

    let mut report = DeleteReport::default();
    for entry in &plan {
        if cancel.is_cancelled() {
            return Err(BatchError::Cancelled { completed: report.deleted });
        }
        let message = commit_message(CommitKind::RemoveFile, entry.name());
        match host.delete_file(repo, &entry.path, &message, &entry.sha) {
            Ok(()) => {
                report.deleted += 1;
                log.info(format!("Deleted {}", entry.path));
            }
            Err(e) if e.is_item_skippable() => {
                report.skipped += 1;
                log.warn(format!("Skipped {}: {}", entry.path, e));
            }
            Err(source) => {
                tracing::warn!(repo, path = %entry.path, error = %source, "recursive delete aborted");
                return Err(BatchError::Aborted { completed: report.deleted, source });
            }
        }
    }
    Ok(report)
}

/// Remote path for a single upload: an empty (or `/`-terminated) target
/// takes the local file name.
pub fn upload_target(local: &Path, remote: &str) -> String {
    let name = local.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let trimmed = remote.trim();
    if trimmed.trim_matches('/').is_empty() {
        name
    } else if trimmed.ends_with('/') {
        paths::join_remote(trimmed, &name)
    } else {
        paths::join_remote("", trimmed)
    }
}

/// Create `remote`, or update it with its current sha when it already exists.
pub fn upload_file(host: &dyn RepoHost, repo: &str, local: &Path, remote: &str) -> Result<UploadOutcome, HostError> {
    let bytes = fs::read(local).map_err(|e| HostError::io(local.display().to_string(), e))?;
    let name = paths::file_name(remote).to_string();
    match host.get_contents(repo, remote) {
        Ok(Contents::File(existing)) => {
            host.update_file(repo, remote, &bytes, &commit_message(CommitKind::UpdateFile, &name), &existing.entry.sha)?;
            Ok(UploadOutcome::Updated)
        }
        Ok(Contents::Directory(_)) => Err(HostError::Conflict(format!("'{}' is a directory", remote))),
        Err(e) if e.is_not_found() => {
            host.create_file(repo, remote, &bytes, &commit_message(CommitKind::AddFile, &name))?;
            Ok(UploadOutcome::Created)
        }
        Err(e) => Err(e),
    }
}

/// Local files under `dir` paired with their remote paths below `remote_base`, sorted.
pub fn collect_upload_files(
    dir: &Path,
    remote_base: &str,
    respect_gitignore: bool,
) -> Result<Vec<(PathBuf, String)>, HostError> {
    if !dir.is_dir() {
        return Err(HostError::io(
            dir.display().to_string(),
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }
    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_exclude(respect_gitignore)
        .git_global(false)
        .require_git(false)
        .filter_entry(|e| e.file_name() != ".git")
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| HostError::io(dir.display().to_string(), std::io::Error::other(e.to_string())))?;
        let path = entry.path();
        if entry.file_type().is_some_and(|t| t.is_file()) {
            let relative = path.strip_prefix(dir).unwrap_or(path);
            files.push((path.to_path_buf(), paths::join_remote(remote_base, &paths::normalize_relative(relative))));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Create every file of a local folder below `remote_base`.
///
/// A remote file that already exists (Conflict) is skipped.
pub fn upload_folder(
    host: &dyn RepoHost,
    repo: &str,
    dir: &Path,
    remote_base: &str,
    respect_gitignore: bool,
    cancel: &CancelToken,
    log: &dyn LogSink,
) -> Result<UploadReport, BatchError> {
    let files = collect_upload_files(dir, remote_base, respect_gitignore)
        .map_err(|source| BatchError::Aborted { completed: 0, source })?;
    log.info(format!("Uploading {} file(s) to '{}'", files.len(), display_path(remote_base)));

    let mut report = UploadReport::default();
    for (local, remote) in &files {
        if cancel.is_cancelled() {
            return Err(BatchError::Cancelled { completed: report.uploaded });
        }
        let bytes = fs::read(local).map_err(|e| BatchError::Aborted {
            completed: report.uploaded,
            source: HostError::io(local.display().to_string(), e),
        })?;
        let message = commit_message(CommitKind::AddFile, paths::file_name(remote));
        match host.create_file(repo, remote, &bytes, &message) {
            Ok(()) => {
                report.uploaded += 1;
                log.info(format!("Uploaded {}", remote));
            }
            Err(e) if e.is_item_skippable() => {
                report.skipped += 1;
                log.warn(format!("Skipped {}: {}", remote, e));
            }
            Err(source) => {
                tracing::warn!(repo, path = %remote, error = %source, "folder upload aborted");
                return Err(BatchError::Aborted { completed: report.uploaded, source });
            }
        }
    }
    Ok(report)
}

/// Write edited text back. Binary content is never written back.
pub fn save_file(
    host: &dyn RepoHost,
    repo: &str,
    path: &str,
    content: &FileContent,
    expected_sha: &str,
) -> Result<(), HostError> {
    match content {
        FileContent::Text(text) => {
            let message = commit_message(CommitKind::EditFile, paths::file_name(path));
            host.update_file(repo, path, text.as_bytes(), &message, expected_sha)
        }
        FileContent::Binary => Err(HostError::Decode(path.to_string())),
    }
}

/// Default local file name for an archive, e.g. `demo.zip`.
pub fn default_archive_name(repo: &str, format: ArchiveFormat) -> String {
    let name = repo.rsplit('/').next().unwrap_or(repo);
    format!("{}.{}", name, format.extension())
}

/// Resolve the signed archive URL and stream it to `dest`. A partial file is
/// removed on failure.
pub fn download_archive(
    host: &dyn RepoHost,
    repo: &str,
    format: ArchiveFormat,
    dest: &Path,
) -> Result<u64, HostError> {
    let url = host.archive_link(repo, format)?;
    let io_err = |e: std::io::Error| HostError::io(dest.display().to_string(), e);
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(dest).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let result = host.download(&url, &mut writer).and_then(|n| writer.flush().map(|_| n).map_err(io_err));
    if result.is_err() {
        drop(writer);
        let _ = fs::remove_file(dest);
    }
    result
}

/// Validate locally, then create.
pub fn create_repository(host: &dyn RepoHost, spec: &NewRepository) -> Result<RepoSummary, HostError> {
    spec.validate()?;
    host.create_repository(spec)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use rp_base::{ErrorKind, LogLevel};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(LogLevel, String)>>);

    impl LogSink for Recorder {
        fn log(&self, level: LogLevel, message: String) {
            self.0.lock().unwrap().push((level, message));
        }
    }

    impl Recorder {
        fn warnings(&self) -> usize {
            self.0.lock().unwrap().iter().filter(|(l, _)| *l == LogLevel::Warning).count()
        }
    }

    fn fixture() -> MemoryHost {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "a/b.txt", b"b");
        host.seed_file("user/r", "a/c/d.txt", b"d");
        host.seed_file("user/r", "e.txt", b"e");
        host
    }

    #[test]
    fn recursive_delete_issues_file_calls_only() {
        let host = fixture();
        let log = Recorder::default();
        let root = RemoteEntry::directory("", "root");
        let report = delete_path(&host, "user/r", &root, &CancelToken::new(), &log).unwrap();
        assert_eq!(report, DeleteReport { deleted: 3, skipped: 0 });
        assert_eq!(host.calls(), vec!["DELETE user/r/a/c/d.txt", "DELETE user/r/a/b.txt", "DELETE user/r/e.txt"]);
    }

    #[test]
    fn not_found_item_is_skipped() {
        let host = fixture();
        host.inject_failure("user/r", "a/b.txt", ErrorKind::NotFound);
        let log = Recorder::default();
        let target = RemoteEntry::directory("a", "s");
        let report = delete_path(&host, "user/r", &target, &CancelToken::new(), &log).unwrap();
        assert_eq!(report, DeleteReport { deleted: 1, skipped: 1 });
        assert_eq!(log.warnings(), 1);
    }

    #[test]
    fn transport_failure_aborts_with_progress() {
        let host = fixture();
        host.inject_failure("user/r", "a/b.txt", ErrorKind::Transport);
        let root = RemoteEntry::directory("", "root");
        let err = delete_path(&host, "user/r", &root, &CancelToken::new(), &Recorder::default()).unwrap_err();
        assert!(matches!(err, BatchError::Aborted { completed: 1, .. }));
        // e.txt was never attempted
        assert!(host.file_bytes("user/r", "e.txt").is_some());
    }

    #[test]
    fn cancelled_batch_stops_before_first_item() {
        let host = fixture();
        let cancel = CancelToken::new();
        cancel.cancel();
        let root = RemoteEntry::directory("", "root");
        let err = delete_path(&host, "user/r", &root, &cancel, &Recorder::default()).unwrap_err();
        assert!(matches!(err, BatchError::Cancelled { completed: 0 }));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn upload_creates_then_updates() {
        let host = MemoryHost::new("user");
        host.add_repository("user/r", false);
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("notes.txt");
        fs::write(&local, "one").unwrap();

        let remote = upload_target(&local, "");
        assert_eq!(remote, "notes.txt");
        assert_eq!(upload_file(&host, "user/r", &local, &remote).unwrap(), UploadOutcome::Created);
        fs::write(&local, "two").unwrap();
        assert_eq!(upload_file(&host, "user/r", &local, &remote).unwrap(), UploadOutcome::Updated);
        assert_eq!(host.file_bytes("user/r", "notes.txt").unwrap(), b"two");
    }

    #[test]
    fn upload_target_rules() {
        let local = Path::new("/tmp/x.txt");
        assert_eq!(upload_target(local, "  "), "x.txt");
        assert_eq!(upload_target(local, "docs/"), "docs/x.txt");
        assert_eq!(upload_target(local, "/docs/y.txt"), "docs/y.txt");
    }

    #[test]
    fn folder_upload_honors_gitignore_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();
        fs::write(dir.path().join("drop.log"), "d").unwrap();

        let all: Vec<String> = collect_upload_files(dir.path(), "up", false).unwrap().into_iter().map(|f| f.1).collect();
        assert_eq!(all, vec!["up/.gitignore", "up/drop.log", "up/keep.txt"]);
        let kept: Vec<String> = collect_upload_files(dir.path(), "up", true).unwrap().into_iter().map(|f| f.1).collect();
        assert_eq!(kept, vec!["up/.gitignore", "up/keep.txt"]);
    }

    #[test]
    fn existing_remote_file_is_skipped_during_folder_upload() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "up/x.txt", b"old");
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "new").unwrap();
        fs::write(dir.path().join("y.txt"), "y").unwrap();
        let report =
            upload_folder(&host, "user/r", dir.path(), "up", false, &CancelToken::new(), &Recorder::default()).unwrap();
        assert_eq!(report, UploadReport { uploaded: 1, skipped: 1 });
        assert_eq!(host.file_bytes("user/r", "up/x.txt").unwrap(), b"old");
    }

    #[test]
    fn binary_save_is_refused() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "img.bin", &[0xff, 0x00]);
        let err = save_file(&host, "user/r", "img.bin", &FileContent::Binary, "sha").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn archive_is_written_to_disk() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "x.txt", b"hello");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join(default_archive_name("user/r", ArchiveFormat::Tarball));
        let written = download_archive(&host, "user/r", ArchiveFormat::Tarball, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap().len() as u64, written);
        assert!(dest.ends_with("r.tar.gz"));
    }

    #[test]
    fn invalid_repository_name_never_reaches_the_host() {
        let host = MemoryHost::new("user");
        let err = create_repository(&host, &NewRepository::new("bad name")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(host.calls().is_empty());
    }
}
