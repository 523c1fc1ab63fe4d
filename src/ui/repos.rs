use ratatui::{prelude::*, widgets::Paragraph};

use super::{helpers::*, theme};
use crate::state::{Focus, State};

pub fn render_repos(frame: &mut Frame, state: &State, area: Rect) {
    let focused = state.focus == Focus::Repositories;
    let block = panel_block(format!("Repositories ({})", state.repos.len()), focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !state.session.is_established() {
        let hint = Line::from(Span::styled(" press l to log in", Style::default().fg(theme::TEXT_MUTED)));
        frame.render_widget(Paragraph::new(hint), inner);
        return;
    }

    let height = inner.height as usize;
    let width = inner.width as usize;
    let start = scroll_offset(state.repo_selected, height);
    let lines: Vec<Line> = state
        .repos
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(i, repo)| {
            let selected = i == state.repo_selected;
            let browsing = state.browsing() == Some(repo.full_name.as_str());
            let marker = if browsing { "▸" } else { " " };
            let lock = if repo.private { "◆" } else { " " };
            let name = truncate_string(&repo.full_name, width.saturating_sub(5));
            let name_style = if selected && focused {
                Style::default().fg(theme::BG_BASE).bg(theme::ACCENT).bold()
            } else if selected {
                Style::default().fg(theme::TEXT).bg(theme::BG_ELEVATED)
            } else {
                Style::default().fg(theme::TEXT)
            };
            Line::from(vec![
                Span::styled(format!("{} ", marker), Style::default().fg(theme::ACCENT)),
                Span::styled(format!("{} ", lock), Style::default().fg(theme::PRIVATE)),
                Span::styled(name, name_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
