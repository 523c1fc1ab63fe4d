//! UI-loop state. Only the UI thread touches it; workers post events instead.
//!
//! - `session`: the authenticated connection
//! - `backend`: GitHub or the in-memory demo host
//! - `token_store`: token file and environment lookup
//! - `form` / `editor`: overlay models

pub mod backend;
pub mod editor;
pub mod form;
pub mod session;
pub mod token_store;

use rp_base::LogBook;
use rp_base::config::Settings;
use rp_base::types::{BrowserCursor, RemoteEntry, RepoSummary};

pub use backend::Backend;
pub use editor::Editor;
pub use form::{Form, FormKind};
pub use session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Repositories,
    Browser,
}

/// What a confirmation dialog will do on `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteRepository(String),
    DeletePath { repository: String, entry: RemoteEntry },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    pub prompt: String,
    pub action: ConfirmAction,
}

pub enum Overlay {
    Form(Form),
    Confirm(Confirm),
    Editor(Editor),
}

pub struct State {
    pub settings: Settings,
    pub backend: Backend,
    pub session: Session,

    pub repos: Vec<RepoSummary>,
    pub repo_selected: usize,

    pub cursor: BrowserCursor,
    pub entries: Vec<RemoteEntry>,
    pub entry_selected: usize,
    /// A listing for the current cursor generation has arrived
    pub listing_loaded: bool,

    pub focus: Focus,
    pub overlay: Option<Overlay>,
    pub logs: LogBook,

    /// Last value of the "save token" toggle
    pub save_token: bool,
    /// Dispatcher has queued or running tasks
    pub busy: bool,
    pub running_labels: Vec<String>,
    pub spinner_frame: u64,
    /// Transient hint in the status bar
    pub hint: Option<String>,
    pub dirty: bool,
}

impl State {
    pub fn new(settings: Settings, backend: Backend) -> Self {
        let save_token = settings.save_token;
        Self {
            settings,
            backend,
            session: Session::default(),
            repos: Vec::new(),
            repo_selected: 0,
            cursor: BrowserCursor::new(),
            entries: Vec::new(),
            entry_selected: 0,
            listing_loaded: false,
            focus: Focus::Repositories,
            overlay: None,
            logs: LogBook::new(),
            save_token,
            busy: false,
            running_labels: Vec::new(),
            spinner_frame: 0,
            hint: None,
            dirty: true,
        }
    }

    pub fn selected_repo(&self) -> Option<&RepoSummary> {
        self.repos.get(self.repo_selected)
    }

    pub fn selected_entry(&self) -> Option<&RemoteEntry> {
        self.entries.get(self.entry_selected)
    }

    /// Repository the browser is rooted at, if any.
    pub fn browsing(&self) -> Option<&str> {
        self.cursor.repository.as_deref()
    }

    pub fn set_repositories(&mut self, repos: Vec<RepoSummary>) {
        self.repos = repos;
        self.repo_selected = self.repo_selected.min(self.repos.len().saturating_sub(1));
        let gone = self.browsing().is_some_and(|current| !self.repos.iter().any(|r| r.full_name == current));
        if gone {
            self.clear_browser();
        }
    }

    pub fn set_entries(&mut self, mut entries: Vec<RemoteEntry>) {
        rp_base::types::sort_for_display(&mut entries);
        self.entries = entries;
        self.entry_selected = self.entry_selected.min(self.entries.len().saturating_sub(1));
        self.listing_loaded = true;
    }

    /// Forget the browsed repository; outstanding listings become stale.
    pub fn clear_browser(&mut self) {
        self.cursor.clear();
        self.entries.clear();
        self.entry_selected = 0;
        self.listing_loaded = false;
    }

    /// Drop everything tied to the logged-in account.
    pub fn logout(&mut self) {
        self.session.reset();
        self.repos.clear();
        self.repo_selected = 0;
        self.clear_browser();
    }

    pub fn select_up(&mut self) {
        match self.focus {
            Focus::Repositories => self.repo_selected = self.repo_selected.saturating_sub(1),
            Focus::Browser => self.entry_selected = self.entry_selected.saturating_sub(1),
        }
    }

    pub fn select_down(&mut self) {
        match self.focus {
            Focus::Repositories => {
                if self.repo_selected + 1 < self.repos.len() {
                    self.repo_selected += 1;
                }
            }
            Focus::Browser => {
                if self.entry_selected + 1 < self.entries.len() {
                    self.entry_selected += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state() -> State {
        State::new(Settings::default(), Backend::Demo(Arc::new(rp_mod_github::MemoryHost::new("u"))))
    }

    fn repo(name: &str) -> RepoSummary {
        RepoSummary { full_name: name.to_string(), private: false, description: None }
    }

    #[test]
    fn removed_repository_clears_browser() {
        let mut state = state();
        state.cursor.navigate("u/a", "src");
        state.set_repositories(vec![repo("u/b")]);
        assert!(state.browsing().is_none());
        assert!(!state.listing_loaded);
    }

    #[test]
    fn entries_are_sorted_and_selection_clamped() {
        let mut state = state();
        state.entry_selected = 5;
        state.set_entries(vec![RemoteEntry::file("z.txt", 1, "1"), RemoteEntry::directory("src", "2")]);
        assert_eq!(state.entries[0].path, "src");
        assert_eq!(state.entry_selected, 1);
    }
}
