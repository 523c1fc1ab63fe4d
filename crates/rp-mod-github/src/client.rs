//! Blocking REST client for the GitHub API.

use std::io::Write;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretBox};

use rp_base::HostError;
use rp_base::config::Settings;
use rp_base::constants::{API_VERSION, PER_PAGE, USER_AGENT as AGENT};
use rp_base::types::{ArchiveFormat, Contents, NewRepository, RemoteFile, RepoSummary};

use crate::api::{
    ApiContent, ApiContentsResponse, ApiErrorBody, ApiRepo, ApiUser, CreateRepoBody, DeleteContentBody,
    PutContentBody, encode_path,
};
use crate::host::RepoHost;

/// Message GitHub returns for `GET contents/` on a repository without commits
const EMPTY_REPOSITORY_MESSAGE: &str = "This repository is empty.";

pub struct GithubClient {
    http: Client,
    /// Same configuration without redirect following, for archive links
    no_redirect: Client,
    api_base: String,
    token: SecretBox<String>,
}

impl GithubClient {
    pub fn new(token: String, settings: &Settings) -> Result<Self, HostError> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(HostError::Authentication("token cannot be empty".to_string()));
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        default_headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        default_headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));

        let build = |policy: Policy| {
            let mut builder = Client::builder().default_headers(default_headers.clone()).redirect(policy);
            // reqwest's blocking client defaults to a 30s timeout; an unset value means none
            builder = builder.timeout(settings.request_timeout_secs.map(Duration::from_secs));
            builder.build().map_err(|e| HostError::Transport(format!("failed to build HTTP client: {}", e)))
        };

        Ok(Self {
            http: build(Policy::default())?,
            no_redirect: build(Policy::none())?,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: SecretBox::new(Box::new(token)),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/{}", self.api_base, tail.trim_start_matches('/'))
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        self.url(&format!("repos/{}/contents/{}", repo, encode_path(path)))
    }

    fn request(&self, client: &Client, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(%method, url, "github request");
        client.request(method, url).header(AUTHORIZATION, format!("Bearer {}", self.token.expose_secret()))
    }

    /// Send and turn transport failures and non-success statuses into [`HostError`].
    fn send(&self, builder: RequestBuilder) -> Result<Response, HostError> {
        let response = builder.send().map_err(|e| HostError::Transport(e.without_url().to_string()))?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(response);
        }
        let text = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.describe())
            .unwrap_or_else(|_| if text.is_empty() { status.to_string() } else { truncate(&text, 200).to_string() });
        tracing::debug!(status = status.as_u16(), %message, "github error response");
        Err(HostError::from_status(status.as_u16(), message))
    }

    fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, HostError> {
        response.json().map_err(|e| HostError::Transport(format!("failed to parse response: {}", e)))
    }

    /// Fetch a file body that the contents API did not inline.
    fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, HostError> {
        let response = self.send(self.request(&self.http, Method::GET, url))?;
        response.bytes().map(|b| b.to_vec()).map_err(|e| HostError::Transport(e.to_string()))
    }

    fn into_remote_file(&self, item: ApiContent) -> Result<RemoteFile, HostError> {
        let bytes = file_body(&item, |url| self.fetch_raw(url))?;
        Ok(RemoteFile { entry: item.to_entry(), bytes })
    }

    fn put_contents(&self, repo: &str, path: &str, body: &PutContentBody) -> Result<(), HostError> {
        let url = self.contents_url(repo, path);
        self.send(self.request(&self.http, Method::PUT, &url).json(body)).map_err(write_error)?;
        Ok(())
    }
}

impl RepoHost for GithubClient {
    fn authenticate(&self) -> Result<String, HostError> {
        let response = self.send(self.request(&self.http, Method::GET, &self.url("user")))?;
        let user: ApiUser = Self::json(response)?;
        Ok(user.login)
    }

    fn list_repositories(&self) -> Result<Vec<RepoSummary>, HostError> {
        let mut repos = paginate(PER_PAGE, |page| {
            let url = self.url(&format!(
                "user/repos?per_page={}&page={}&affiliation=owner,collaborator,organization_member",
                PER_PAGE, page
            ));
            let batch: Vec<ApiRepo> = Self::json(self.send(self.request(&self.http, Method::GET, &url))?)?;
            Ok(batch.into_iter().map(RepoSummary::from).collect())
        })?;
        repos.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(repos)
    }

    fn get_contents(&self, repo: &str, path: &str) -> Result<Contents, HostError> {
        let url = self.contents_url(repo, path);
        let response = match self.send(self.request(&self.http, Method::GET, &url)) {
            Ok(response) => response,
            Err(e) if is_empty_repository(path, &e) => return Ok(Contents::Directory(Vec::new())),
            Err(e) => return Err(e),
        };
        match Self::json::<ApiContentsResponse>(response)? {
            ApiContentsResponse::Listing(items) => Ok(Contents::Directory(items.iter().map(ApiContent::to_entry).collect())),
            ApiContentsResponse::Single(item) => Ok(Contents::File(self.into_remote_file(*item)?)),
        }
    }

    fn create_file(&self, repo: &str, path: &str, bytes: &[u8], message: &str) -> Result<(), HostError> {
        self.put_contents(repo, path, &PutContentBody::new(message, bytes, None))
    }

    fn update_file(
        &self,
        repo: &str,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected_sha: &str,
    ) -> Result<(), HostError> {
        self.put_contents(repo, path, &PutContentBody::new(message, bytes, Some(expected_sha)))
    }

    fn delete_file(&self, repo: &str, path: &str, message: &str, expected_sha: &str) -> Result<(), HostError> {
        let url = self.contents_url(repo, path);
        let body = DeleteContentBody { message, sha: expected_sha };
        self.send(self.request(&self.http, Method::DELETE, &url).json(&body)).map_err(write_error)?;
        Ok(())
    }

    fn create_repository(&self, spec: &NewRepository) -> Result<RepoSummary, HostError> {
        let body = CreateRepoBody::from(spec);
        let response = self.send(self.request(&self.http, Method::POST, &self.url("user/repos")).json(&body))?;
        let repo: ApiRepo = Self::json(response)?;
        Ok(repo.into())
    }

    fn delete_repository(&self, repo: &str) -> Result<(), HostError> {
        self.send(self.request(&self.http, Method::DELETE, &self.url(&format!("repos/{}", repo))))?;
        Ok(())
    }

    fn archive_link(&self, repo: &str, format: ArchiveFormat) -> Result<String, HostError> {
        let url = self.url(&format!("repos/{}/{}", repo, format.as_str()));
        let response = self.send(self.request(&self.no_redirect, Method::GET, &url))?;
        archive_location(response.status(), response.headers(), &url)
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, HostError> {
        let builder = if url.starts_with(&self.api_base) {
            self.request(&self.http, Method::GET, url)
        } else {
            // Signed URLs carry their own credential
            self.http.get(url)
        };
        let mut response = self.send(builder)?;
        response.copy_to(sink).map_err(|e| HostError::Transport(format!("download interrupted: {}", e)))
    }
}

/// Fetch pages (numbered from 1) until one comes back shorter than `per_page`.
fn paginate<T>(per_page: usize, mut fetch: impl FnMut(usize) -> Result<Vec<T>, HostError>) -> Result<Vec<T>, HostError> {
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch(page)?;
        let count = batch.len();
        all.extend(batch);
        if count < per_page {
            return Ok(all);
        }
        page += 1;
    }
}

/// GitHub answers `GET contents/` on a repository without commits with a 404.
fn is_empty_repository(path: &str, err: &HostError) -> bool {
    matches!(err, HostError::NotFound(message) if path.is_empty() && message.starts_with(EMPTY_REPOSITORY_MESSAGE))
}

/// A rejected write (PUT or DELETE on contents) means the sha is stale or the
/// path already exists; GitHub reports either as 409 or 422.
fn write_error(err: HostError) -> HostError {
    err.validation_as_conflict()
}

/// File body from the inline base64 content, else from `download_url`.
fn file_body(item: &ApiContent, fetch: impl FnOnce(&str) -> Result<Vec<u8>, HostError>) -> Result<Vec<u8>, HostError> {
    match item.inline_bytes()? {
        Some(bytes) => Ok(bytes),
        None => match item.download_url.as_deref() {
            Some(url) => fetch(url),
            None => Err(HostError::Decode(item.path.clone())),
        },
    }
}

/// Signed archive URL from a non-following archive request.
fn archive_location(status: StatusCode, headers: &HeaderMap, url: &str) -> Result<String, HostError> {
    if status.is_redirection() {
        return headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| HostError::Transport("archive redirect without a Location header".to_string()));
    }
    // Some proxies serve the archive directly
    Ok(url.to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings { api_base: "https://ghe.example.com/api/v3/".to_string(), ..Settings::default() }
    }

    #[test]
    fn empty_token_is_rejected_locally() {
        let err = GithubClient::new("   ".to_string(), &settings()).err().unwrap();
        assert_eq!(err.kind(), rp_base::ErrorKind::Authentication);
    }

    #[test]
    fn urls_are_built_from_the_api_base() {
        let client = GithubClient::new("ghp_test".to_string(), &settings()).unwrap();
        assert_eq!(client.url("user"), "https://ghe.example.com/api/v3/user");
        assert_eq!(
            client.contents_url("user/demo", "docs/read me.md"),
            "https://ghe.example.com/api/v3/repos/user/demo/contents/docs/read%20me.md"
        );
        assert_eq!(client.contents_url("user/demo", ""), "https://ghe.example.com/api/v3/repos/user/demo/contents/");
    }

    #[test]
    fn pagination_stops_on_a_short_page() {
        let mut requested = Vec::new();
        let all = paginate(2, |page| {
            requested.push(page);
            Ok(match page {
                1 => vec!["a", "b"],
                2 => vec!["c", "d"],
                _ => vec!["e"],
            })
        })
        .unwrap();
        assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(requested, vec![1, 2, 3]);
    }

    #[test]
    fn exact_multiple_asks_for_one_empty_page() {
        let mut calls = 0;
        let all = paginate(2, |page| {
            calls += 1;
            Ok(if page == 1 { vec![1, 2] } else { Vec::new() })
        })
        .unwrap();
        assert_eq!(all, vec![1, 2]);
        assert_eq!(calls, 2);
    }

    #[test]
    fn page_failure_is_returned() {
        let err = paginate::<u8>(2, |_| Err(HostError::Transport("reset".into()))).unwrap_err();
        assert_eq!(err.kind(), rp_base::ErrorKind::Transport);
    }

    #[test]
    fn empty_repository_only_at_the_root() {
        let empty = HostError::from_status(404, "This repository is empty.");
        assert!(is_empty_repository("", &empty));
        assert!(!is_empty_repository("docs", &empty));
        assert!(!is_empty_repository("", &HostError::from_status(404, "Not Found")));
        assert!(!is_empty_repository("", &HostError::from_status(409, "This repository is empty.")));
    }

    #[test]
    fn rejected_writes_are_conflicts() {
        assert_eq!(write_error(HostError::from_status(409, "sha mismatch")).kind(), rp_base::ErrorKind::Conflict);
        assert_eq!(write_error(HostError::from_status(422, "sha wasn't supplied")).kind(), rp_base::ErrorKind::Conflict);
        assert_eq!(write_error(HostError::from_status(404, "Not Found")).kind(), rp_base::ErrorKind::NotFound);
        assert_eq!(write_error(HostError::from_status(403, "no scope")).kind(), rp_base::ErrorKind::Authentication);
    }

    #[test]
    fn missing_body_is_fetched_from_download_url() {
        let item: ApiContent = serde_json::from_str(
            r#"{"path":"big.bin","type":"file","size":5000000,"sha":"s","content":"","encoding":"none","download_url":"https://raw.example/big.bin"}"#,
        )
        .unwrap();
        let mut fetched = None;
        let bytes = file_body(&item, |url| {
            fetched = Some(url.to_string());
            Ok(vec![1, 2, 3])
        })
        .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(fetched.as_deref(), Some("https://raw.example/big.bin"));
    }

    #[test]
    fn inline_body_skips_the_fetch() {
        let item: ApiContent = serde_json::from_str(
            r#"{"path":"a.txt","type":"file","size":3,"sha":"s","content":"aGk=\n","encoding":"base64"}"#,
        )
        .unwrap();
        let bytes = file_body(&item, |_| panic!("inline body must not be fetched")).unwrap();
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn body_without_content_or_url_is_a_decode_error() {
        let item: ApiContent =
            serde_json::from_str(r#"{"path":"odd","type":"file","size":10,"sha":"s","encoding":"none"}"#).unwrap();
        let err = file_body(&item, |_| Ok(Vec::new())).unwrap_err();
        assert_eq!(err.kind(), rp_base::ErrorKind::Decode);
    }

    #[test]
    fn archive_link_comes_from_location() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://codeload.example/u/r/zip/main?token=t"));
        let url = "https://api.example/repos/u/r/zipball";
        assert_eq!(
            archive_location(StatusCode::FOUND, &headers, url).unwrap(),
            "https://codeload.example/u/r/zip/main?token=t"
        );
        // Served directly: the request URL is the download
        assert_eq!(archive_location(StatusCode::OK, &HeaderMap::new(), url).unwrap(), url);
        let err = archive_location(StatusCode::FOUND, &HeaderMap::new(), url).unwrap_err();
        assert_eq!(err.kind(), rp_base::ErrorKind::Transport);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
