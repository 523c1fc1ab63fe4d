//! Applies worker events to [`State`] on the UI loop.

use rp_base::LogLevel;
use rp_base::LogEntry;

use super::actions::Request;
use super::messages::UiEvent;
use crate::state::{Editor, Overlay, State};

/// Apply one event. Returns follow-up work (reload after a mutation, list
/// after login). Follow-ups bypass the busy gate: they are not user input.
pub fn apply_event(state: &mut State, event: UiEvent) -> Vec<Request> {
    state.dirty = true;
    match event {
        UiEvent::Log(entry) => {
            state.logs.push(entry);
            Vec::new()
        }
        UiEvent::LoggedIn { identity, host } => {
            state.logout();
            state.session.establish(host, identity);
            vec![Request::ListRepositories]
        }
        UiEvent::LoginFailed => {
            state.logout();
            Vec::new()
        }
        UiEvent::Repositories(repos) => {
            // A list that lands after logout belongs to no session
            if state.session.is_established() {
                state.set_repositories(repos);
            } else {
                tracing::debug!(count = repos.len(), "repository list after logout discarded");
            }
            Vec::new()
        }
        UiEvent::Listing { repository, path, generation, entries } => {
            if state.cursor.is_current(&repository, generation) {
                state.set_entries(entries);
            } else {
                tracing::debug!(%repository, %path, generation, current = state.cursor.generation(), "stale listing discarded");
            }
            Vec::new()
        }
        UiEvent::FileOpened { repository, entry, content } => {
            // A file opened after its repository was left is dropped
            if state.browsing() == Some(repository.as_str()) {
                state.overlay = Some(Overlay::Editor(Editor::open(repository, entry, content)));
            }
            Vec::new()
        }
        UiEvent::FileSaved { repository, path } => {
            let editing = matches!(&state.overlay, Some(Overlay::Editor(ed)) if ed.repository == repository && ed.entry.path == path);
            if editing {
                state.overlay = None;
            }
            refresh_if_browsing(state, &repository)
        }
        UiEvent::RepositoryCreated(_) => vec![Request::ListRepositories],
        UiEvent::RepositoryDeleted(repository) => {
            if state.browsing() == Some(repository.as_str()) {
                state.clear_browser();
            }
            vec![Request::ListRepositories]
        }
        UiEvent::ContentsChanged { repository } => refresh_if_browsing(state, &repository),
    }
}

fn refresh_if_browsing(state: &mut State, repository: &str) -> Vec<Request> {
    if state.browsing() != Some(repository) || !state.session.is_established() {
        return Vec::new();
    }
    match state.cursor.refresh() {
        Some((repository, path, generation)) => vec![Request::Browse { repository, path, generation }],
        None => Vec::new(),
    }
}

/// Log pane line for a task that died without reporting.
pub fn panicked_task(state: &mut State, label: &str) {
    state.logs.push(LogEntry::new(LogLevel::Error, format!("{} failed unexpectedly (see the log file)", label)));
    state.dirty = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Backend;
    use rp_base::config::Settings;
    use rp_base::types::{FileContent, RemoteEntry, RepoSummary};
    use rp_mod_github::MemoryHost;
    use std::sync::Arc;

    fn state() -> State {
        let host = Arc::new(MemoryHost::new("u"));
        let mut state = State::new(Settings::default(), Backend::Demo(host.clone()));
        state.session.establish(host, "u".into());
        state
    }

    fn listing(repository: &str, generation: u64, names: &[&str]) -> UiEvent {
        UiEvent::Listing {
            repository: repository.to_string(),
            path: String::new(),
            generation,
            entries: names.iter().map(|n| RemoteEntry::file(*n, 1, "s")).collect(),
        }
    }

    #[test]
    fn stale_listing_is_discarded() {
        let mut state = state();
        let first = state.cursor.navigate("u/r", "");
        let second = state.cursor.navigate("u/r", "src");
        apply_event(&mut state, listing("u/r", first, &["old.txt"]));
        assert!(state.entries.is_empty());
        assert!(!state.listing_loaded);
        apply_event(&mut state, listing("u/r", second, &["new.txt"]));
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].path, "new.txt");
    }

    #[test]
    fn listing_for_another_repository_is_discarded() {
        let mut state = state();
        let generation = state.cursor.navigate("u/r", "");
        apply_event(&mut state, listing("u/other", generation, &["x"]));
        assert!(state.entries.is_empty());
    }

    #[test]
    fn login_resets_then_lists() {
        let mut state = State::new(Settings::default(), Backend::Demo(Arc::new(MemoryHost::new("u"))));
        let host: Arc<dyn rp_mod_github::RepoHost> = Arc::new(MemoryHost::new("u"));
        let follow = apply_event(&mut state, UiEvent::LoggedIn { identity: "u".into(), host });
        assert_eq!(follow, vec![Request::ListRepositories]);
        assert_eq!(state.session.identity(), Some("u"));
    }

    #[test]
    fn repository_list_after_logout_is_discarded() {
        let mut state = state();
        state.logout();
        let repo = RepoSummary { full_name: "u/r".into(), private: false, description: None };
        apply_event(&mut state, UiEvent::Repositories(vec![repo.clone()]));
        assert!(state.repos.is_empty());

        state.session.establish(Arc::new(MemoryHost::new("u")), "u".into());
        apply_event(&mut state, UiEvent::Repositories(vec![repo]));
        assert_eq!(state.repos.len(), 1);
    }

    #[test]
    fn mutation_refreshes_the_browsed_repository_only() {
        let mut state = state();
        state.cursor.navigate("u/r", "docs");
        let follow = apply_event(&mut state, UiEvent::ContentsChanged { repository: "u/r".into() });
        let generation = state.cursor.generation();
        assert_eq!(follow, vec![Request::Browse { repository: "u/r".into(), path: "docs".into(), generation }]);
        assert!(apply_event(&mut state, UiEvent::ContentsChanged { repository: "u/x".into() }).is_empty());
    }

    #[test]
    fn saved_file_closes_its_editor() {
        let mut state = state();
        state.cursor.navigate("u/r", "");
        let entry = RemoteEntry::file("a.txt", 1, "s");
        apply_event(
            &mut state,
            UiEvent::FileOpened { repository: "u/r".into(), entry, content: FileContent::Text("a".into()) },
        );
        assert!(matches!(state.overlay, Some(Overlay::Editor(_))));
        apply_event(&mut state, UiEvent::FileSaved { repository: "u/r".into(), path: "a.txt".into() });
        assert!(state.overlay.is_none());
    }

    #[test]
    fn deleted_repository_leaves_the_browser() {
        let mut state = state();
        state.cursor.navigate("u/r", "");
        let follow = apply_event(&mut state, UiEvent::RepositoryDeleted("u/r".into()));
        assert!(state.browsing().is_none());
        assert_eq!(follow, vec![Request::ListRepositories]);
    }
}
