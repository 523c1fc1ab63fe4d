use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_REPO_NAME_LEN;
use crate::error::HostError;
use crate::paths;

// =============================================================================
// Remote entries
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// One file or directory record from a contents listing.
/// `sha` is only valid against the snapshot it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub sha: String,
}

impl RemoteEntry {
    pub fn file(path: impl Into<String>, size: u64, sha: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::File, size: Some(size), sha: sha.into() }
    }

    pub fn directory(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::Directory, size: None, sha: sha.into() }
    }

    pub fn name(&self) -> &str {
        paths::file_name(&self.path)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Browser ordering: directories first, then case-insensitive name.
pub fn sort_for_display(entries: &mut [RemoteEntry]) {
    entries.sort_by_cached_key(|e| (!e.is_dir(), e.name().to_lowercase()));
}

#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub entry: RemoteEntry,
    pub bytes: Vec<u8>,
}

impl RemoteFile {
    pub fn decode(&self) -> FileContent {
        FileContent::decode(&self.bytes)
    }
}

/// Result of a contents lookup: a single file or a directory listing.
#[derive(Debug, Clone)]
pub enum Contents {
    File(RemoteFile),
    Directory(Vec<RemoteEntry>),
}

/// File bytes as the editor sees them. Undecodable bytes degrade to a
/// read-only placeholder instead of failing the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary,
}

impl FileContent {
    pub fn decode(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => FileContent::Text(text.to_string()),
            Err(_) => FileContent::Binary,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, FileContent::Binary)
    }
}

// =============================================================================
// Repositories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

static REPO_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("repository name pattern is valid"));

/// Parameters for repository creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    pub auto_init: bool,
    pub gitignore_template: Option<String>,
    pub license_template: Option<String>,
}

impl NewRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            visibility: Visibility::Private,
            auto_init: true,
            gitignore_template: None,
            license_template: None,
        }
    }

    /// Local checks run before any remote call.
    pub fn validate(&self) -> Result<(), HostError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(HostError::Validation("repository name is required".to_string()));
        }
        if name.len() > MAX_REPO_NAME_LEN {
            return Err(HostError::Validation(format!("repository name exceeds {} characters", MAX_REPO_NAME_LEN)));
        }
        if name == "." || name == ".." || !REPO_NAME_RE.is_match(name) {
            return Err(HostError::Validation(format!(
                "'{}' is not a valid repository name (letters, digits, '.', '-', '_')",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    #[default]
    Zipball,
    Tarball,
}

impl ArchiveFormat {
    /// Path segment of the archive endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zipball => "zipball",
            ArchiveFormat::Tarball => "tarball",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zipball => "zip",
            ArchiveFormat::Tarball => "tar.gz",
        }
    }
}

// =============================================================================
// Browser cursor
// =============================================================================

/// Where the tree view is rooted. Every navigation bumps the generation so a
/// listing that completes after a newer navigation can be recognized as stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserCursor {
    pub repository: Option<String>,
    pub path: String,
    generation: u64,
}

impl BrowserCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Point the cursor at `repository`/`path`; returns the new generation.
    pub fn navigate(&mut self, repository: &str, path: &str) -> u64 {
        self.repository = Some(repository.to_string());
        self.path = path.trim_matches('/').to_string();
        self.generation += 1;
        self.generation
    }

    /// Re-list the current location. None when no repository is selected.
    pub fn refresh(&mut self) -> Option<(String, String, u64)> {
        let repository = self.repository.clone()?;
        self.generation += 1;
        Some((repository, self.path.clone(), self.generation))
    }

    /// Move to the parent directory. None at the root or without a repository.
    pub fn ascend(&mut self) -> Option<(String, String, u64)> {
        if self.path.is_empty() {
            return None;
        }
        let repository = self.repository.clone()?;
        let parent = paths::parent(&self.path);
        let generation = self.navigate(&repository, &parent);
        Some((repository, parent, generation))
    }

    /// Forget the repository (deselected or deleted).
    pub fn clear(&mut self) {
        self.repository = None;
        self.path.clear();
        self.generation += 1;
    }

    pub fn is_current(&self, repository: &str, generation: u64) -> bool {
        self.generation == generation && self.repository.as_deref() == Some(repository)
    }
}
