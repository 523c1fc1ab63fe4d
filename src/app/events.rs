use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::actions::{Action, EditorInput, FormInput};
use crate::state::{Overlay, State};

/// Map a terminal event to an action. `None` means quit.
pub fn handle_event(event: &Event, state: &State) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

            // Global Ctrl shortcuts (always handled first)
            if ctrl && key.code == KeyCode::Char('q') {
                return None;
            }

            match &state.overlay {
                Some(Overlay::Form(form)) => Some(form_key(key, form.selected_is_text())),
                Some(Overlay::Confirm(_)) => Some(confirm_key(key)),
                Some(Overlay::Editor(_)) => Some(editor_key(key, ctrl)),
                None => main_key(key),
            }
        }
        _ => Some(Action::None),
    }
}

fn main_key(key: &KeyEvent) -> Option<Action> {
    let action = match key.code {
        KeyCode::Char('q') => return None,
        KeyCode::Tab | KeyCode::BackTab => Action::FocusNext,
        KeyCode::Up | KeyCode::Char('k') => Action::SelectUp,
        KeyCode::Down | KeyCode::Char('j') => Action::SelectDown,
        KeyCode::Enter => Action::Open,
        KeyCode::Backspace | KeyCode::Left => Action::Ascend,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('R') => Action::ReloadRepositories,
        KeyCode::Char('l') => Action::OpenLogin,
        KeyCode::Char('o') => Action::Logout,
        KeyCode::Char('n') => Action::OpenCreateRepository,
        KeyCode::Char('d') | KeyCode::Delete => Action::RequestDelete,
        KeyCode::Char('u') => Action::OpenUploadFile,
        KeyCode::Char('U') => Action::OpenUploadFolder,
        KeyCode::Char('s') => Action::OpenDownloadArchive,
        KeyCode::Char('x') => Action::CancelTasks,
        _ => Action::None,
    };
    Some(action)
}

fn form_key(key: &KeyEvent, text_field: bool) -> Action {
    let input = match key.code {
        KeyCode::Esc => return Action::CloseOverlay,
        KeyCode::Enter => FormInput::Submit,
        KeyCode::Tab | KeyCode::Down => FormInput::NextField,
        KeyCode::BackTab | KeyCode::Up => FormInput::PrevField,
        KeyCode::Backspace => FormInput::Backspace,
        KeyCode::Left if !text_field => FormInput::Cycle { forward: false },
        KeyCode::Right if !text_field => FormInput::Cycle { forward: true },
        KeyCode::Char(' ') if !text_field => FormInput::Cycle { forward: true },
        KeyCode::Char(c) => FormInput::Char(c),
        _ => return Action::None,
    };
    Action::Form(input)
}

fn confirm_key(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Action::ConfirmYes,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::ConfirmNo,
        _ => Action::None,
    }
}

fn editor_key(key: &KeyEvent, ctrl: bool) -> Action {
    if ctrl {
        return match key.code {
            KeyCode::Char('s') => Action::EditorSave,
            _ => Action::None,
        };
    }
    let input = match key.code {
        KeyCode::Esc => return Action::CloseOverlay,
        KeyCode::Enter => EditorInput::Newline,
        KeyCode::Backspace => EditorInput::Backspace,
        KeyCode::Up => EditorInput::Up,
        KeyCode::Down => EditorInput::Down,
        KeyCode::Left => EditorInput::Left,
        KeyCode::Right => EditorInput::Right,
        KeyCode::Tab => EditorInput::Char('\t'),
        KeyCode::Char(c) => EditorInput::Char(c),
        _ => return Action::None,
    };
    Action::Editor(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Backend, Form};
    use rp_base::config::Settings;
    use rp_mod_github::MemoryHost;
    use std::sync::Arc;

    fn state() -> State {
        State::new(Settings::default(), Backend::Demo(Arc::new(MemoryHost::new("u"))))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn q_quits_only_without_overlay() {
        let mut state = state();
        assert_eq!(handle_event(&key(KeyCode::Char('q')), &state), None);
        state.overlay = Some(Overlay::Form(Form::login(false)));
        assert_eq!(handle_event(&key(KeyCode::Char('q')), &state), Some(Action::Form(FormInput::Char('q'))));
        let ctrl_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&ctrl_q, &state), None);
    }

    #[test]
    fn space_toggles_only_outside_text_fields() {
        let mut state = state();
        state.overlay = Some(Overlay::Form(Form::login(false)));
        assert_eq!(handle_event(&key(KeyCode::Char(' ')), &state), Some(Action::Form(FormInput::Char(' '))));
        if let Some(Overlay::Form(form)) = state.overlay.as_mut() {
            form.next_field();
        }
        assert_eq!(
            handle_event(&key(KeyCode::Char(' ')), &state),
            Some(Action::Form(FormInput::Cycle { forward: true }))
        );
    }

    #[test]
    fn main_keys() {
        let state = state();
        assert_eq!(handle_event(&key(KeyCode::Char('U')), &state), Some(Action::OpenUploadFolder));
        assert_eq!(handle_event(&key(KeyCode::Char('x')), &state), Some(Action::CancelTasks));
        assert_eq!(handle_event(&key(KeyCode::Backspace), &state), Some(Action::Ascend));
    }
}
