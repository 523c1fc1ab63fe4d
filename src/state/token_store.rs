//! Plaintext token file next to the working directory, plus the
//! environment fallback.

use std::fs;
use std::io;
use std::path::Path;

use rp_base::HostError;
use rp_base::constants::TOKEN_ENV_VAR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    File,
    Environment,
}

impl TokenSource {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenSource::File => "token file",
            TokenSource::Environment => TOKEN_ENV_VAR,
        }
    }
}

/// Trimmed token from `path`, None when missing or blank.
pub fn load(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub fn save(path: &Path, token: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, token.trim())
}

/// Remove the token file; a missing file is not an error.
pub fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Apply the "save token" choice after a successful login.
pub fn persist(path: &Path, token: &str, save_token: bool) -> Result<(), HostError> {
    let result = if save_token { save(path, token) } else { remove(path) };
    result.map_err(|e| HostError::io(path.display().to_string(), e))
}

/// Token for the automatic startup login: the token file first, then the
/// environment (which includes a loaded `.env`).
pub fn startup_token(path: &Path) -> Option<(String, TokenSource)> {
    if let Some(token) = load(path) {
        return Some((token, TokenSource::File));
    }
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| (t, TokenSource::Environment))
}
