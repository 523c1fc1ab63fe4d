use std::sync::Arc;

use rp_base::HostError;
use rp_mod_github::RepoHost;

/// The authenticated connection. Empty until a credential check succeeds;
/// reset on logout or a failed login. Owned by [`super::State`] and passed
/// to tasks by cloning the host handle.
#[derive(Default)]
pub struct Session {
    host: Option<Arc<dyn RepoHost>>,
    identity: Option<String>,
}

impl Session {
    pub fn establish(&mut self, host: Arc<dyn RepoHost>, identity: String) {
        self.host = Some(host);
        self.identity = Some(identity);
    }

    pub fn reset(&mut self) {
        self.host = None;
        self.identity = None;
    }

    pub fn is_established(&self) -> bool {
        self.host.is_some()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Host handle for a task, or Authentication when nobody is logged in.
    pub fn host(&self) -> Result<Arc<dyn RepoHost>, HostError> {
        self.host.clone().ok_or_else(|| HostError::Authentication("not logged in".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_base::ErrorKind;
    use rp_mod_github::MemoryHost;

    #[test]
    fn lifecycle() {
        let mut session = Session::default();
        assert_eq!(session.host().err().map(|e| e.kind()), Some(ErrorKind::Authentication));

        session.establish(Arc::new(MemoryHost::new("user")), "user".to_string());
        assert!(session.is_established());
        assert_eq!(session.identity(), Some("user"));
        assert!(session.host().is_ok());

        session.reset();
        assert!(!session.is_established());
        assert!(session.identity().is_none());
    }
}
