//! Wire shapes of the GitHub REST responses and request bodies we use.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use rp_base::HostError;
use rp_base::types::{NewRepository, RemoteEntry, RepoSummary, Visibility};

#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiRepo {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ApiRepo> for RepoSummary {
    fn from(repo: ApiRepo) -> Self {
        RepoSummary { full_name: repo.full_name, private: repo.private, description: repo.description }
    }
}

/// One item of `GET /repos/{repo}/contents/{path}`.
#[derive(Debug, Deserialize)]
pub struct ApiContent {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ApiContent {
    /// Symlinks and submodules are listed as files; only "dir" is a directory.
    pub fn to_entry(&self) -> RemoteEntry {
        if self.kind == "dir" {
            RemoteEntry::directory(&self.path, &self.sha)
        } else {
            RemoteEntry::file(&self.path, self.size, &self.sha)
        }
    }

    /// Inline body, when the API included one. Large files come back with
    /// `encoding: none` and must be fetched from `download_url`.
    pub fn inline_bytes(&self) -> Result<Option<Vec<u8>>, HostError> {
        match (self.encoding.as_deref(), self.content.as_deref()) {
            (Some("base64"), Some(body)) => decode_base64(body).map(Some).map_err(|_| HostError::Decode(self.path.clone())),
            (_, Some("")) if self.size == 0 => Ok(Some(Vec::new())),
            _ => Ok(None),
        }
    }
}

/// The contents endpoint answers with an object for a file and an array for a directory.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiContentsResponse {
    Listing(Vec<ApiContent>),
    Single(Box<ApiContent>),
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

impl ApiErrorBody {
    /// Server message plus the first detailed validation error, if any.
    pub fn describe(&self) -> String {
        let detail = self.errors.first().and_then(|e| {
            e.get("message").and_then(|m| m.as_str()).map(str::to_string).or_else(|| {
                e.get("code").and_then(|c| c.as_str()).map(|code| {
                    let field = e.get("field").and_then(|f| f.as_str()).unwrap_or("");
                    format!("{} {}", field, code).trim().to_string()
                })
            })
        });
        match detail {
            Some(d) if !d.is_empty() => format!("{} ({})", self.message, d),
            _ => self.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PutContentBody<'a> {
    pub message: &'a str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

impl<'a> PutContentBody<'a> {
    pub fn new(message: &'a str, bytes: &[u8], sha: Option<&'a str>) -> Self {
        Self { message, content: STANDARD.encode(bytes), sha }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteContentBody<'a> {
    pub message: &'a str,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateRepoBody<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'a str,
    pub private: bool,
    pub auto_init: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<&'a str>,
}

impl<'a> From<&'a NewRepository> for CreateRepoBody<'a> {
    fn from(spec: &'a NewRepository) -> Self {
        Self {
            name: spec.name.trim(),
            description: spec.description.trim(),
            private: spec.visibility == Visibility::Private,
            auto_init: spec.auto_init,
            gitignore_template: spec.gitignore_template.as_deref().filter(|s| !s.is_empty()),
            license_template: spec.license_template.as_deref().filter(|s| !s.is_empty()),
        }
    }
}

/// GitHub wraps base64 bodies at 60 columns; strip whitespace before decoding.
pub fn decode_base64(body: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Percent-encode each segment of a repo-relative path, keeping `/`.
pub fn encode_path(path: &str) -> String {
    path.split('/').filter(|s| !s.is_empty()).map(urlenc).collect::<Vec<_>>().join("/")
}

fn urlenc(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(b as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", b));
            }
        }
    }
    result
}
