//! User intents (from key events) and the remote work they request.

use std::path::PathBuf;

use rp_base::{LogEntry, LogLevel};
use rp_base::types::{ArchiveFormat, FileContent, NewRepository, RemoteEntry};
use rp_mod_github::batch::{default_archive_name, upload_target};

use crate::state::{Confirm, ConfirmAction, Editor, Focus, Form, FormKind, Overlay, State};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    FocusNext,
    SelectUp,
    SelectDown,
    Open,
    Ascend,
    Refresh,
    ReloadRepositories,
    OpenLogin,
    Logout,
    OpenCreateRepository,
    RequestDelete,
    OpenUploadFile,
    OpenUploadFolder,
    OpenDownloadArchive,
    CancelTasks,
    Form(FormInput),
    ConfirmYes,
    ConfirmNo,
    Editor(EditorInput),
    EditorSave,
    CloseOverlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput {
    Char(char),
    Backspace,
    NextField,
    PrevField,
    Cycle { forward: bool },
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorInput {
    Char(char),
    Newline,
    Backspace,
    Up,
    Down,
    Left,
    Right,
}

/// Remote work asked for by an action or by an applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login { token: String, save_token: bool },
    ListRepositories,
    Browse { repository: String, path: String, generation: u64 },
    OpenFile { repository: String, entry: RemoteEntry },
    Save { repository: String, entry: RemoteEntry, content: FileContent },
    DeletePath { repository: String, entry: RemoteEntry },
    DeleteRepository(String),
    CreateRepository(NewRepository),
    UploadFile { repository: String, local: PathBuf, remote: String },
    UploadFolder { repository: String, local: PathBuf, remote: String, respect_gitignore: bool },
    DownloadArchive { repository: String, format: ArchiveFormat, dest: PathBuf },
}

/// Outcome of one action for the loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ActionResult {
    Nothing,
    Dispatch(Request),
    CancelTasks,
}

const BUSY_HINT: &str = "Busy: wait for the running task or press x to cancel";

pub fn apply_action(state: &mut State, action: Action) -> ActionResult {
    state.dirty = true;
    state.hint = None;

    // Local-only actions first; everything that dispatches is gated on `busy`.
    match action {
        Action::None => return ActionResult::Nothing,
        Action::FocusNext => {
            state.focus = match state.focus {
                Focus::Repositories => Focus::Browser,
                Focus::Browser => Focus::Repositories,
            };
            return ActionResult::Nothing;
        }
        Action::SelectUp => {
            state.select_up();
            return ActionResult::Nothing;
        }
        Action::SelectDown => {
            state.select_down();
            return ActionResult::Nothing;
        }
        Action::CancelTasks => return ActionResult::CancelTasks,
        Action::CloseOverlay | Action::ConfirmNo => {
            state.overlay = None;
            return ActionResult::Nothing;
        }
        Action::Form(input) if input != FormInput::Submit => {
            if let Some(Overlay::Form(form)) = state.overlay.as_mut() {
                match input {
                    FormInput::Char(c) => form.insert_char(c),
                    FormInput::Backspace => form.backspace(),
                    FormInput::NextField => form.next_field(),
                    FormInput::PrevField => form.prev_field(),
                    FormInput::Cycle { forward } => form.cycle(forward),
                    FormInput::Submit => {}
                }
            }
            return ActionResult::Nothing;
        }
        Action::Editor(input) => {
            if let Some(Overlay::Editor(editor)) = state.overlay.as_mut() {
                apply_editor_input(editor, input);
            }
            return ActionResult::Nothing;
        }
        Action::Logout => {
            if state.session.is_established() {
                let who = state.session.identity().unwrap_or_default().to_string();
                state.logout();
                log(state, LogLevel::Info, format!("Logged out {}", who));
            }
            return ActionResult::Nothing;
        }
        Action::OpenLogin => {
            state.overlay = Some(Overlay::Form(Form::login(state.save_token)));
            return ActionResult::Nothing;
        }
        _ => {}
    }

    if state.busy {
        state.hint = Some(BUSY_HINT.to_string());
        return ActionResult::Nothing;
    }

    match action {
        Action::Open => open_selected(state),
        Action::Ascend => match state.cursor.ascend() {
            Some((repository, path, generation)) => browse(state, repository, path, generation),
            None => ActionResult::Nothing,
        },
        Action::Refresh => match state.cursor.refresh() {
            Some((repository, path, generation)) => browse(state, repository, path, generation),
            None => ActionResult::Nothing,
        },
        Action::ReloadRepositories => require_session(state, Request::ListRepositories),
        Action::OpenCreateRepository => open_form(state, Form::create_repository()),
        Action::OpenUploadFile if state.browsing().is_some() => {
            let form = Form::upload_file(&state.cursor.path);
            open_form(state, form)
        }
        Action::OpenUploadFolder if state.browsing().is_some() => {
            let form = Form::upload_folder(&state.cursor.path, state.settings.respect_gitignore);
            open_form(state, form)
        }
        Action::OpenUploadFile | Action::OpenUploadFolder => no_repository(state),
        Action::OpenDownloadArchive => match target_repository(state) {
            Some(repo) => {
                let format = state.settings.archive_format;
                open_form(state, Form::download_archive(&default_archive_name(&repo, format), format))
            }
            None => no_repository(state),
        },
        Action::RequestDelete => request_delete(state),
        Action::ConfirmYes => confirm(state),
        Action::EditorSave => save_editor(state),
        Action::Form(_) => submit_form(state),
        _ => ActionResult::Nothing,
    }
}

fn log(state: &mut State, level: LogLevel, message: String) {
    match level {
        LogLevel::Error => tracing::error!("{}", message),
        LogLevel::Warning => tracing::warn!("{}", message),
        _ => tracing::info!("{}", message),
    }
    state.logs.push(LogEntry::new(level, message));
}

fn require_session(state: &mut State, request: Request) -> ActionResult {
    if state.session.is_established() {
        ActionResult::Dispatch(request)
    } else {
        log(state, LogLevel::Warning, "Not logged in (press l)".to_string());
        ActionResult::Nothing
    }
}

fn no_repository(state: &mut State) -> ActionResult {
    log(state, LogLevel::Warning, "Open a repository first".to_string());
    ActionResult::Nothing
}

fn open_form(state: &mut State, form: Form) -> ActionResult {
    if !state.session.is_established() {
        return require_session(state, Request::ListRepositories);
    }
    state.overlay = Some(Overlay::Form(form));
    ActionResult::Nothing
}

fn browse(state: &mut State, repository: String, path: String, generation: u64) -> ActionResult {
    state.listing_loaded = false;
    state.entry_selected = 0;
    require_session(state, Request::Browse { repository, path, generation })
}

/// Repository for whole-repository actions: the focused list item, or the browsed one.
fn target_repository(state: &State) -> Option<String> {
    match state.focus {
        Focus::Repositories => state.selected_repo().map(|r| r.full_name.clone()),
        Focus::Browser => state.browsing().map(str::to_string),
    }
}

fn open_selected(state: &mut State) -> ActionResult {
    match state.focus {
        Focus::Repositories => {
            let Some(repo) = state.selected_repo().map(|r| r.full_name.clone()) else {
                return ActionResult::Nothing;
            };
            let generation = state.cursor.navigate(&repo, "");
            state.focus = Focus::Browser;
            state.entries.clear();
            browse(state, repo, String::new(), generation)
        }
        Focus::Browser => {
            let (Some(repository), Some(entry)) = (state.browsing().map(str::to_string), state.selected_entry().cloned())
            else {
                return ActionResult::Nothing;
            };
            if entry.is_dir() {
                let generation = state.cursor.navigate(&repository, &entry.path);
                browse(state, repository, entry.path, generation)
            } else {
                require_session(state, Request::OpenFile { repository, entry })
            }
        }
    }
}

fn request_delete(state: &mut State) -> ActionResult {
    let confirm = match state.focus {
        Focus::Repositories => state.selected_repo().map(|r| Confirm {
            prompt: format!("Delete repository {}? This cannot be undone.", r.full_name),
            action: ConfirmAction::DeleteRepository(r.full_name.clone()),
        }),
        Focus::Browser => match (state.browsing(), state.selected_entry()) {
            (Some(repository), Some(entry)) => Some(Confirm {
                prompt: if entry.is_dir() {
                    format!("Delete every file under {}/?", entry.path)
                } else {
                    format!("Delete {}?", entry.path)
                },
                action: ConfirmAction::DeletePath { repository: repository.to_string(), entry: entry.clone() },
            }),
            _ => None,
        },
    };
    if let Some(confirm) = confirm {
        state.overlay = Some(Overlay::Confirm(confirm));
    }
    ActionResult::Nothing
}

fn confirm(state: &mut State) -> ActionResult {
    let Some(Overlay::Confirm(confirm)) = state.overlay.take() else {
        return ActionResult::Nothing;
    };
    let request = match confirm.action {
        ConfirmAction::DeleteRepository(repo) => Request::DeleteRepository(repo),
        ConfirmAction::DeletePath { repository, entry } => Request::DeletePath { repository, entry },
    };
    require_session(state, request)
}

fn save_editor(state: &mut State) -> ActionResult {
    let Some(Overlay::Editor(editor)) = state.overlay.as_ref() else {
        return ActionResult::Nothing;
    };
    if editor.is_read_only() {
        log(state, LogLevel::Warning, "Binary files cannot be edited".to_string());
        return ActionResult::Nothing;
    }
    if !editor.modified {
        state.hint = Some("No changes to save".to_string());
        return ActionResult::Nothing;
    }
    let request =
        Request::Save { repository: editor.repository.clone(), entry: editor.entry.clone(), content: editor.content() };
    require_session(state, request)
}

fn apply_editor_input(editor: &mut Editor, input: EditorInput) {
    match input {
        EditorInput::Char(c) => editor.insert_char(c),
        EditorInput::Newline => editor.newline(),
        EditorInput::Backspace => editor.backspace(),
        EditorInput::Up => editor.move_up(),
        EditorInput::Down => editor.move_down(),
        EditorInput::Left => editor.move_left(),
        EditorInput::Right => editor.move_right(),
    }
}

/// Turn a filled-in form into a request; invalid input keeps the form open with an error.
fn submit_form(state: &mut State) -> ActionResult {
    let Some(Overlay::Form(form)) = state.overlay.as_mut() else {
        return ActionResult::Nothing;
    };

    let request = match form.kind {
        FormKind::Login => {
            let token = form.text("Token").trim().to_string();
            if token.is_empty() {
                form.error = Some("Token is required".to_string());
                return ActionResult::Nothing;
            }
            let save_token = form.toggle("Save token");
            state.save_token = save_token;
            state.overlay = None;
            return ActionResult::Dispatch(Request::Login { token, save_token });
        }
        FormKind::CreateRepository => {
            let spec = form.new_repository();
            if let Err(e) = spec.validate() {
                form.error = Some(e.to_string());
                return ActionResult::Nothing;
            }
            Request::CreateRepository(spec)
        }
        FormKind::UploadFile => {
            let local = PathBuf::from(form.text("Local file").trim());
            if !local.is_file() {
                form.error = Some(format!("'{}' is not a file", local.display()));
                return ActionResult::Nothing;
            }
            let remote = upload_target(&local, form.text("Remote path"));
            match state.browsing() {
                Some(repository) => Request::UploadFile { repository: repository.to_string(), local, remote },
                None => return ActionResult::Nothing,
            }
        }
        FormKind::UploadFolder => {
            let local = PathBuf::from(form.text("Local folder").trim());
            if !local.is_dir() {
                form.error = Some(format!("'{}' is not a folder", local.display()));
                return ActionResult::Nothing;
            }
            let remote = rp_base::paths::join_remote("", form.text("Remote base"));
            let respect_gitignore = form.toggle("Honor .gitignore");
            match state.browsing() {
                Some(repository) => {
                    Request::UploadFolder { repository: repository.to_string(), local, remote, respect_gitignore }
                }
                None => return ActionResult::Nothing,
            }
        }
        FormKind::DownloadArchive => {
            let dest = form.text("Save to").trim().to_string();
            if dest.is_empty() {
                form.error = Some("Destination is required".to_string());
                return ActionResult::Nothing;
            }
            let format = form.archive_format();
            match target_repository(state) {
                Some(repository) => Request::DownloadArchive { repository, format, dest: PathBuf::from(dest) },
                None => return ActionResult::Nothing,
            }
        }
    };
    state.overlay = None;
    require_session(state, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Backend;
    use rp_base::config::Settings;
    use rp_base::types::RepoSummary;
    use rp_mod_github::MemoryHost;
    use std::sync::Arc;

    fn logged_in() -> State {
        let host = Arc::new(MemoryHost::new("u"));
        let mut state = State::new(Settings::default(), Backend::Demo(host.clone()));
        state.session.establish(host, "u".to_string());
        state.repos = vec![RepoSummary { full_name: "u/r".into(), private: false, description: None }];
        state
    }

    #[test]
    fn opening_a_repository_bumps_the_generation() {
        let mut state = logged_in();
        let result = apply_action(&mut state, Action::Open);
        let generation = state.cursor.generation();
        assert_eq!(
            result,
            ActionResult::Dispatch(Request::Browse { repository: "u/r".into(), path: String::new(), generation })
        );
        assert_eq!(state.focus, Focus::Browser);
    }

    #[test]
    fn dispatching_actions_are_disabled_while_busy() {
        let mut state = logged_in();
        state.busy = true;
        assert_eq!(apply_action(&mut state, Action::Open), ActionResult::Nothing);
        assert!(state.hint.is_some());
        assert_eq!(state.cursor.generation(), 0);
        // Local actions still work
        apply_action(&mut state, Action::FocusNext);
        assert_eq!(state.focus, Focus::Browser);
        assert_eq!(apply_action(&mut state, Action::CancelTasks), ActionResult::CancelTasks);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut state = logged_in();
        assert_eq!(apply_action(&mut state, Action::RequestDelete), ActionResult::Nothing);
        assert!(matches!(state.overlay, Some(Overlay::Confirm(_))));
        assert_eq!(
            apply_action(&mut state, Action::ConfirmYes),
            ActionResult::Dispatch(Request::DeleteRepository("u/r".into()))
        );
        assert!(state.overlay.is_none());
    }

    #[test]
    fn invalid_repository_name_keeps_form_open() {
        let mut state = logged_in();
        apply_action(&mut state, Action::OpenCreateRepository);
        for c in "bad name".chars() {
            apply_action(&mut state, Action::Form(FormInput::Char(c)));
        }
        assert_eq!(apply_action(&mut state, Action::Form(FormInput::Submit)), ActionResult::Nothing);
        match &state.overlay {
            Some(Overlay::Form(form)) => assert!(form.error.is_some()),
            _ => panic!("form should stay open"),
        }
    }

    #[test]
    fn login_form_dispatches_without_a_session() {
        let mut state = State::new(Settings::default(), Backend::Demo(Arc::new(MemoryHost::new("u"))));
        apply_action(&mut state, Action::OpenLogin);
        for c in "tok".chars() {
            apply_action(&mut state, Action::Form(FormInput::Char(c)));
        }
        let result = apply_action(&mut state, Action::Form(FormInput::Submit));
        assert_eq!(result, ActionResult::Dispatch(Request::Login { token: "tok".into(), save_token: true }));
    }
}
