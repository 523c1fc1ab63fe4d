use std::io::Write;

use rp_base::HostError;
use rp_base::types::{ArchiveFormat, Contents, NewRepository, RepoSummary};

/// Authenticated access to a repository-hosting service.
///
/// Every method is a blocking remote call and must only run on a worker
/// thread. `repo` is always a full name (`owner/name`); `path` is
/// repo-root-relative with `/` separators ("" is the root).
pub trait RepoHost: Send + Sync {
    /// Check the credential and return the account login.
    fn authenticate(&self) -> Result<String, HostError>;

    fn list_repositories(&self) -> Result<Vec<RepoSummary>, HostError>;

    fn get_contents(&self, repo: &str, path: &str) -> Result<Contents, HostError>;

    /// Fails with Conflict when `path` already exists.
    fn create_file(&self, repo: &str, path: &str, bytes: &[u8], message: &str) -> Result<(), HostError>;

    /// Fails with Conflict when `expected_sha` is stale.
    fn update_file(
        &self,
        repo: &str,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected_sha: &str,
    ) -> Result<(), HostError>;

    /// Fails with NotFound when the file is already gone.
    fn delete_file(&self, repo: &str, path: &str, message: &str, expected_sha: &str) -> Result<(), HostError>;

    /// Fails with Validation on an invalid or duplicate name.
    fn create_repository(&self, spec: &NewRepository) -> Result<RepoSummary, HostError>;

    fn delete_repository(&self, repo: &str) -> Result<(), HostError>;

    /// Signed, short-lived download URL for a repository archive.
    fn archive_link(&self, repo: &str, format: ArchiveFormat) -> Result<String, HostError>;

    /// Stream the body at `url` verbatim into `sink`, returning the byte count.
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, HostError>;
}
