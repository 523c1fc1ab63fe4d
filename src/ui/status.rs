use ratatui::{prelude::*, widgets::Paragraph};

use super::{helpers::*, theme};
use crate::state::{Focus, Overlay, State};

pub fn render_status_bar(frame: &mut Frame, state: &State, area: Rect) {
    let base_style = Style::default().bg(theme::BG_BASE).fg(theme::TEXT_MUTED);
    let mut spans = vec![Span::styled(" ", base_style)];

    if state.busy {
        let label = match state.running_labels.as_slice() {
            [] => "QUEUED".to_string(),
            [only] => only.clone(),
            [first, rest @ ..] => format!("{} +{}", first, rest.len()),
        };
        spans.push(Span::styled(
            format!(" {} {} ", spinner(state.spinner_frame), truncate_string(&label, 40)),
            Style::default().fg(theme::BG_BASE).bg(theme::WARNING).bold(),
        ));
    } else {
        spans.push(Span::styled(" READY ", Style::default().fg(theme::BG_BASE).bg(theme::TEXT_MUTED).bold()));
    }
    spans.push(Span::styled(" ", base_style));

    if let Some(hint) = &state.hint {
        spans.push(Span::styled(hint.clone(), Style::default().fg(theme::WARNING)));
    } else {
        spans.push(Span::styled(key_help(state), base_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base_style), area);
}

fn key_help(state: &State) -> &'static str {
    match (&state.overlay, state.focus) {
        (Some(Overlay::Form(_)), _) => "Tab next · ←/→/Space change · Enter submit · Esc cancel",
        (Some(Overlay::Confirm(_)), _) => "y confirm · n cancel",
        (Some(Overlay::Editor(_)), _) => "Ctrl+S save · Esc close",
        (None, Focus::Repositories) => "Enter open · n new · d delete · s archive · R reload · l login · o logout · q quit",
        (None, Focus::Browser) => {
            "Enter open · ⌫ up · r refresh · u upload · U folder · d delete · s archive · x cancel · q quit"
        }
    }
}
