//! In-process [`RepoHost`] used by tests and the `--demo` mode.
//!
//! Repositories are flat maps of file path to bytes; directories exist only
//! implicitly, as prefixes of file paths, the same way the contents API
//! presents them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use rp_base::types::{ArchiveFormat, Contents, NewRepository, RemoteEntry, RemoteFile, RepoSummary, Visibility};
use rp_base::{ErrorKind, HostError, paths};

use crate::host::RepoHost;

const ARCHIVE_SCHEME: &str = "memory://";

#[derive(Debug, Default)]
struct MemoryRepo {
    private: bool,
    description: Option<String>,
    license_template: Option<String>,
    files: BTreeMap<String, StoredFile>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    bytes: Vec<u8>,
    sha: String,
}

impl StoredFile {
    fn new(bytes: Vec<u8>) -> Self {
        let sha = format!("{:x}", Sha256::digest(&bytes));
        Self { bytes, sha }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    repos: BTreeMap<String, MemoryRepo>,
    /// "repo:path" → failure returned by every call touching that path
    failures: HashMap<String, ErrorKind>,
    /// Mutating calls in order, as "VERB repo/path"
    calls: Vec<String>,
}

pub struct MemoryHost {
    identity: String,
    state: Mutex<MemoryState>,
}

impl MemoryHost {
    pub fn new(identity: impl Into<String>) -> Self {
        Self { identity: identity.into(), state: Mutex::new(MemoryState::default()) }
    }

    /// Demo account with one sample repository.
    pub fn demo() -> Self {
        let host = Self::new("demo-user");
        let repo = "demo-user/sample";
        host.add_repository(repo, false);
        host.seed_file(repo, "README.md", b"# sample\n\nA repository served from memory.\n");
        host.seed_file(repo, "src/main.rs", b"fn main() {\n    println!(\"hello\");\n}\n");
        host.seed_file(repo, "src/lib/util.rs", b"pub fn answer() -> u32 {\n    42\n}\n");
        host.seed_file(repo, "assets/logo.bin", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0x00, 0xfe]);
        host
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not wedge the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_repository(&self, full_name: &str, private: bool) {
        self.state().repos.entry(full_name.to_string()).or_default().private = private;
    }

    pub fn seed_file(&self, repo: &str, path: &str, bytes: &[u8]) {
        let path = normalize(path);
        self.state().repos.entry(repo.to_string()).or_default().files.insert(path, StoredFile::new(bytes.to_vec()));
    }

    /// Make every call on `repo`/`path` fail with `kind` until cleared.
    pub fn inject_failure(&self, repo: &str, path: &str, kind: ErrorKind) {
        self.state().failures.insert(failure_key(repo, &normalize(path)), kind);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Mutating calls received so far, e.g. `DELETE user/demo/a/b.txt`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn file_bytes(&self, repo: &str, path: &str) -> Option<Vec<u8>> {
        self.state().repos.get(repo)?.files.get(&normalize(path)).map(|f| f.bytes.clone())
    }

    pub fn license_of(&self, repo: &str) -> Option<String> {
        self.state().repos.get(repo)?.license_template.clone()
    }

    fn check_failure(state: &MemoryState, repo: &str, path: &str) -> Result<(), HostError> {
        match state.failures.get(&failure_key(repo, path)) {
            Some(kind) => Err(injected(*kind, repo, path)),
            None => Ok(()),
        }
    }
}

impl RepoHost for MemoryHost {
    fn authenticate(&self) -> Result<String, HostError> {
        Ok(self.identity.clone())
    }

    fn list_repositories(&self) -> Result<Vec<RepoSummary>, HostError> {
        let state = self.state();
        Ok(state
            .repos
            .iter()
            .map(|(name, repo)| RepoSummary {
                full_name: name.clone(),
                private: repo.private,
                description: repo.description.clone(),
            })
            .collect())
    }

    fn get_contents(&self, repo: &str, path: &str) -> Result<Contents, HostError> {
        let path = normalize(path);
        let state = self.state();
        Self::check_failure(&state, repo, &path)?;
        let stored = state.repos.get(repo).ok_or_else(|| HostError::NotFound(repo.to_string()))?;

        if let Some(file) = stored.files.get(&path) {
            let entry = RemoteEntry::file(&path, file.bytes.len() as u64, &file.sha);
            return Ok(Contents::File(RemoteFile { entry, bytes: file.bytes.clone() }));
        }

        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        for (file_path, file) in &stored.files {
            if path.is_empty() || paths::is_within(file_path, &path) {
                let rest = if path.is_empty() { file_path.as_str() } else { &file_path[path.len() + 1..] };
                match rest.split_once('/') {
                    Some((dir, _)) => {
                        dirs.insert(paths::join_remote(&path, dir));
                    }
                    None => files.push(RemoteEntry::file(file_path, file.bytes.len() as u64, &file.sha)),
                }
            }
        }
        if files.is_empty() && dirs.is_empty() && !path.is_empty() {
            return Err(HostError::NotFound(format!("{}/{}", repo, path)));
        }

        let mut entries: Vec<RemoteEntry> = dirs
            .into_iter()
            .map(|dir| {
                let sha = format!("{:x}", Sha256::digest(dir.as_bytes()));
                RemoteEntry::directory(dir, sha)
            })
            .collect();
        entries.extend(files);
        Ok(Contents::Directory(entries))
    }

    fn create_file(&self, repo: &str, path: &str, bytes: &[u8], _message: &str) -> Result<(), HostError> {
        let path = normalize(path);
        let mut state = self.state();
        state.calls.push(format!("CREATE {}/{}", repo, path));
        Self::check_failure(&state, repo, &path)?;
        let stored = state.repos.get_mut(repo).ok_or_else(|| HostError::NotFound(repo.to_string()))?;
        if stored.files.contains_key(&path) {
            return Err(HostError::Conflict(format!("'{}' already exists", path)));
        }
        if stored.files.keys().any(|existing| paths::is_within(existing, &path)) {
            return Err(HostError::Conflict(format!("'{}' is a directory", path)));
        }
        stored.files.insert(path, StoredFile::new(bytes.to_vec()));
        Ok(())
    }

    fn update_file(
        &self,
        repo: &str,
        path: &str,
        bytes: &[u8],
        _message: &str,
        expected_sha: &str,
    ) -> Result<(), HostError> {
        let path = normalize(path);
        let mut state = self.state();
        state.calls.push(format!("UPDATE {}/{}", repo, path));
        Self::check_failure(&state, repo, &path)?;
        let stored = state.repos.get_mut(repo).ok_or_else(|| HostError::NotFound(repo.to_string()))?;
        match stored.files.get(&path) {
            Some(current) if current.sha == expected_sha => {
                stored.files.insert(path, StoredFile::new(bytes.to_vec()));
                Ok(())
            }
            Some(_) => Err(HostError::Conflict(format!("'{}' does not match {}", path, expected_sha))),
            None => Err(HostError::NotFound(format!("{}/{}", repo, path))),
        }
    }

    fn delete_file(&self, repo: &str, path: &str, _message: &str, expected_sha: &str) -> Result<(), HostError> {
        let path = normalize(path);
        let mut state = self.state();
        state.calls.push(format!("DELETE {}/{}", repo, path));
        Self::check_failure(&state, repo, &path)?;
        let stored = state.repos.get_mut(repo).ok_or_else(|| HostError::NotFound(repo.to_string()))?;
        match stored.files.get(&path) {
            Some(current) if current.sha == expected_sha => {
                stored.files.remove(&path);
                Ok(())
            }
            Some(_) => Err(HostError::Conflict(format!("'{}' does not match {}", path, expected_sha))),
            None => Err(HostError::NotFound(format!("{}/{}", repo, path))),
        }
    }

    fn create_repository(&self, spec: &NewRepository) -> Result<RepoSummary, HostError> {
        spec.validate()?;
        let full_name = format!("{}/{}", self.identity, spec.name.trim());
        let mut state = self.state();
        state.calls.push(format!("CREATE_REPO {}", full_name));
        if state.repos.contains_key(&full_name) {
            return Err(HostError::Validation("name already exists on this account".to_string()));
        }

        let description = Some(spec.description.trim().to_string()).filter(|d| !d.is_empty());
        let mut repo = MemoryRepo {
            private: spec.visibility == Visibility::Private,
            description: description.clone(),
            license_template: spec.license_template.clone().filter(|l| !l.is_empty()),
            files: BTreeMap::new(),
        };
        if spec.auto_init {
            let mut readme = format!("# {}\n", spec.name.trim());
            if let Some(d) = &description {
                readme.push_str(&format!("\n{}\n", d));
            }
            repo.files.insert("README.md".to_string(), StoredFile::new(readme.into_bytes()));
        }
        if let Some(template) = spec.gitignore_template.as_deref().filter(|t| !t.is_empty()) {
            let body = format!("# {} template\ntarget/\n", template);
            repo.files.insert(".gitignore".to_string(), StoredFile::new(body.into_bytes()));
        }
        let summary = RepoSummary { full_name: full_name.clone(), private: repo.private, description };
        state.repos.insert(full_name, repo);
        Ok(summary)
    }

    fn delete_repository(&self, repo: &str) -> Result<(), HostError> {
        let mut state = self.state();
        state.calls.push(format!("DELETE_REPO {}", repo));
        Self::check_failure(&state, repo, "")?;
        state.repos.remove(repo).map(|_| ()).ok_or_else(|| HostError::NotFound(repo.to_string()))
    }

    fn archive_link(&self, repo: &str, format: ArchiveFormat) -> Result<String, HostError> {
        let state = self.state();
        Self::check_failure(&state, repo, "")?;
        if !state.repos.contains_key(repo) {
            return Err(HostError::NotFound(repo.to_string()));
        }
        Ok(format!("{}{}/{}", ARCHIVE_SCHEME, repo, format.as_str()))
    }

    /// Archives are a plain manifest: each file's path line followed by its bytes.
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, HostError> {
        let repo = url
            .strip_prefix(ARCHIVE_SCHEME)
            .and_then(|rest| rest.rsplit_once('/'))
            .map(|(repo, _format)| repo.to_string())
            .ok_or_else(|| HostError::NotFound(url.to_string()))?;
        let body = {
            let state = self.state();
            let stored = state.repos.get(&repo).ok_or_else(|| HostError::NotFound(repo.clone()))?;
            let mut body = Vec::new();
            for (path, file) in &stored.files {
                body.extend_from_slice(path.as_bytes());
                body.push(b'\n');
                body.extend_from_slice(&file.bytes);
            }
            body
        };
        sink.write_all(&body).map_err(|e| HostError::io(url, e))?;
        Ok(body.len() as u64)
    }
}

fn normalize(path: &str) -> String {
    paths::join_remote("", path)
}

fn failure_key(repo: &str, path: &str) -> String {
    format!("{}:{}", repo, path)
}

fn injected(kind: ErrorKind, repo: &str, path: &str) -> HostError {
    let message = format!("injected failure on {}/{}", repo, path);
    match kind {
        ErrorKind::Authentication => HostError::Authentication(message),
        ErrorKind::NotFound => HostError::NotFound(message),
        ErrorKind::Conflict => HostError::Conflict(message),
        ErrorKind::Validation => HostError::Validation(message),
        ErrorKind::Transport => HostError::Transport(message),
        ErrorKind::Decode => HostError::Decode(message),
        ErrorKind::Api => HostError::Api { status: 500, message },
        ErrorKind::Io => HostError::io(path, std::io::Error::other(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(host: &MemoryHost, repo: &str, path: &str) -> Vec<RemoteEntry> {
        match host.get_contents(repo, path).unwrap() {
            Contents::Directory(entries) => entries,
            Contents::File(_) => panic!("expected a directory"),
        }
    }

    #[test]
    fn directories_are_implicit() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "a/b.txt", b"b");
        host.seed_file("user/r", "a/c/d.txt", b"d");
        host.seed_file("user/r", "e.txt", b"e");

        let root = listing(&host, "user/r", "");
        assert_eq!(root.len(), 2);
        assert!(root[0].is_dir() && root[0].path == "a");
        assert_eq!(root[1].path, "e.txt");

        let a = listing(&host, "user/r", "a");
        let paths: Vec<&str> = a.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/c", "a/b.txt"]);

        assert!(host.get_contents("user/r", "missing").unwrap_err().is_not_found());
    }

    #[test]
    fn sha_guards_update_and_delete() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "f.txt", b"v1");
        let sha = match host.get_contents("user/r", "f.txt").unwrap() {
            Contents::File(file) => file.entry.sha,
            Contents::Directory(_) => panic!("expected a file"),
        };
        host.update_file("user/r", "f.txt", b"v2", "m", &sha).unwrap();
        let err = host.delete_file("user/r", "f.txt", "m", &sha).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(host.create_file("user/r", "f.txt", b"x", "m").unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[test]
    fn repository_creation_and_duplicates() {
        let host = MemoryHost::new("user");
        let mut spec = NewRepository::new("demo");
        spec.license_template = Some("mit".to_string());
        let summary = host.create_repository(&spec).unwrap();
        assert_eq!(summary.full_name, "user/demo");
        assert_eq!(host.license_of("user/demo").as_deref(), Some("mit"));
        assert_eq!(host.create_repository(&spec).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn injected_failures_apply_to_one_path() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "x.txt", b"x");
        host.inject_failure("user/r", "x.txt", ErrorKind::Transport);
        assert_eq!(host.get_contents("user/r", "x.txt").unwrap_err().kind(), ErrorKind::Transport);
        assert!(host.get_contents("user/r", "").is_ok());
        host.clear_failures();
        assert!(host.get_contents("user/r", "x.txt").is_ok());
    }

    #[test]
    fn archive_download_streams_every_file() {
        let host = MemoryHost::new("user");
        host.seed_file("user/r", "x.txt", b"hello");
        let url = host.archive_link("user/r", ArchiveFormat::Zipball).unwrap();
        let mut sink = Vec::new();
        let written = host.download(&url, &mut sink).unwrap();
        assert_eq!(written as usize, sink.len());
        assert_eq!(sink, b"x.txt\nhello");
    }
}
