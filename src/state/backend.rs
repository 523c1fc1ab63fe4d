use std::sync::Arc;

use rp_base::HostError;
use rp_base::config::Settings;
use rp_mod_github::{GithubClient, MemoryHost, RepoHost};

/// What a login connects to.
#[derive(Clone)]
pub enum Backend {
    Github(Settings),
    /// `--demo`: in-memory host, any non-empty token is accepted
    Demo(Arc<MemoryHost>),
}

impl Backend {
    /// Build the host for `token`. Runs on a worker: the REST client is
    /// constructed here, the credential is checked by the caller.
    pub fn connect(&self, token: &str) -> Result<Arc<dyn RepoHost>, HostError> {
        match self {
            Backend::Github(settings) => {
                let client: Arc<dyn RepoHost> = Arc::new(GithubClient::new(token.to_string(), settings)?);
                Ok(client)
            }
            Backend::Demo(host) => {
                if token.trim().is_empty() {
                    return Err(HostError::Authentication("token cannot be empty".to_string()));
                }
                let host: Arc<dyn RepoHost> = host.clone();
                Ok(host)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Github(_) => "GitHub",
            Backend::Demo(_) => "demo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_accepts_any_non_empty_token() {
        let backend = Backend::Demo(Arc::new(MemoryHost::demo()));
        let host = backend.connect("anything").unwrap();
        assert_eq!(host.authenticate().unwrap(), "demo-user");
        assert!(backend.connect("  ").is_err());
    }
}
