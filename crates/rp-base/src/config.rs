//! Runtime settings (config.json) and embedded defaults (defaults.yaml).
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_FILE, DEFAULT_API_BASE, DEFAULT_MAX_WORKERS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TOKEN_FILE, STORE_DIR,
};
use crate::types::ArchiveFormat;

// ============================================================================
// Settings (config.json)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// REST API root (GitHub Enterprise installs use https://host/api/v3)
    pub api_base: String,
    /// Plaintext token file, relative to the working directory
    pub token_file: String,
    /// Initial state of the "save token" toggle in the login form
    pub save_token: bool,
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub archive_format: ArchiveFormat,
    /// Per-request timeout; None blocks until the server answers
    pub request_timeout_secs: Option<u64>,
    /// Skip .gitignore'd files during folder upload
    pub respect_gitignore: bool,
    pub log_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_file: DEFAULT_TOKEN_FILE.to_string(),
            save_token: true,
            max_workers: DEFAULT_MAX_WORKERS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            archive_format: ArchiveFormat::Zipball,
            request_timeout_secs: None,
            respect_gitignore: false,
            log_dir: PathBuf::from(STORE_DIR).join("logs").to_string_lossy().into_owned(),
        }
    }
}

impl Settings {
    pub fn token_path(&self) -> PathBuf {
        PathBuf::from(&self.token_file)
    }
}

fn config_path() -> PathBuf {
    PathBuf::from(STORE_DIR).join(CONFIG_FILE)
}

/// Load settings from .repo-pilot/config.json, falling back to defaults when
/// the file is missing or unreadable.
pub fn load_settings() -> Settings {
    load_settings_from(&config_path()).unwrap_or_default()
}

pub fn load_settings_from(path: &Path) -> Option<Settings> {
    let json = fs::read_to_string(path).ok()?;
    serde_json::from_str(&json).ok()
}

// ============================================================================
// Embedded defaults (defaults.yaml)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct LicenseChoice {
    pub label: String,
    /// GitHub license template key; empty means no license
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitMessages {
    pub add_file: String,
    pub update_file: String,
    pub edit_file: String,
    pub remove_file: String,
}

#[derive(Debug, Deserialize)]
pub struct Defaults {
    pub licenses: Vec<LicenseChoice>,
    pub default_license: String,
    pub gitignore_templates: Vec<String>,
    pub default_gitignore: String,
    pub commit_messages: CommitMessages,
}

impl Defaults {
    /// Template key for a license label ("" and unknown labels mean none).
    pub fn license_key(&self, label: &str) -> Option<&str> {
        self.licenses.iter().find(|l| l.label == label).map(|l| l.key.as_str()).filter(|k| !k.is_empty())
    }
}

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

pub static DEFAULTS: LazyLock<Defaults> =
    LazyLock::new(|| parse_yaml("defaults.yaml", include_str!("../../../yamls/defaults.yaml")));

/// Which commit message template an operation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    AddFile,
    UpdateFile,
    EditFile,
    RemoveFile,
}

/// Render the commit message for `kind` touching the file `name`.
pub fn commit_message(kind: CommitKind, name: &str) -> String {
    let messages = &DEFAULTS.commit_messages;
    let template = match kind {
        CommitKind::AddFile => &messages.add_file,
        CommitKind::UpdateFile => &messages.update_file,
        CommitKind::EditFile => &messages.edit_file,
        CommitKind::RemoveFile => &messages.remove_file,
    };
    template.replace("{name}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        assert!(DEFAULTS.licenses.iter().any(|l| l.label == DEFAULTS.default_license));
        assert!(DEFAULTS.gitignore_templates.contains(&DEFAULTS.default_gitignore));
    }

    #[test]
    fn license_key_lookup() {
        assert_eq!(DEFAULTS.license_key("MIT License"), Some("mit"));
        assert_eq!(DEFAULTS.license_key("None"), None);
        assert_eq!(DEFAULTS.license_key("Nonexistent"), None);
    }

    #[test]
    fn commit_messages_substitute_name() {
        assert_eq!(commit_message(CommitKind::RemoveFile, "README.md"), "chore: remove README.md");
        assert_eq!(commit_message(CommitKind::AddFile, "x.txt"), "feat: add x.txt");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "max_workers": 2, "archive_format": "tarball" }"#).unwrap();
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.max_workers, 2);
        assert_eq!(settings.archive_format, ArchiveFormat::Tarball);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert!(settings.save_token);
    }

    #[test]
    fn malformed_config_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_settings_from(&path).is_none());
        assert!(load_settings_from(&dir.path().join("missing.json")).is_none());
    }
}
