use ratatui::{prelude::*, widgets::Paragraph};

use super::{helpers::*, theme};
use crate::state::{Focus, State};

pub fn render_browser(frame: &mut Frame, state: &State, area: Rect) {
    let focused = state.focus == Focus::Browser;
    let title = match state.browsing() {
        Some(repository) if state.cursor.path.is_empty() => format!("{}/", repository),
        Some(repository) => format!("{}/{}", repository, state.cursor.path),
        None => "Files".to_string(),
    };
    let block = panel_block(title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let muted = Style::default().fg(theme::TEXT_MUTED);
    if state.browsing().is_none() {
        frame.render_widget(Paragraph::new(Span::styled(" select a repository and press Enter", muted)), inner);
        return;
    }
    if !state.listing_loaded {
        let text = format!(" {} loading…", spinner(state.spinner_frame));
        frame.render_widget(Paragraph::new(Span::styled(text, muted)), inner);
        return;
    }
    if state.entries.is_empty() {
        frame.render_widget(Paragraph::new(Span::styled(" (empty)", muted)), inner);
        return;
    }

    let height = inner.height as usize;
    let width = inner.width as usize;
    let start = scroll_offset(state.entry_selected, height);
    let lines: Vec<Line> = state
        .entries
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(i, entry)| {
            let selected = i == state.entry_selected;
            let (icon, color, size) = if entry.is_dir() {
                ("▸", theme::DIRECTORY, String::new())
            } else {
                (" ", theme::TEXT, entry.size.map(format_size).unwrap_or_default())
            };
            let mut name = entry.name().to_string();
            if entry.is_dir() {
                name.push('/');
            }
            let name = truncate_string(&name, width.saturating_sub(12));
            let pad = width.saturating_sub(3 + unicode_width::UnicodeWidthStr::width(name.as_str()) + size.len());
            let row_style = if selected && focused {
                Style::default().fg(theme::BG_BASE).bg(theme::ACCENT)
            } else if selected {
                Style::default().fg(color).bg(theme::BG_ELEVATED)
            } else {
                Style::default().fg(color)
            };
            Line::from(vec![
                Span::styled(format!(" {} ", icon), Style::default().fg(theme::DIRECTORY)),
                Span::styled(name, row_style),
                Span::raw(" ".repeat(pad)),
                Span::styled(size, Style::default().fg(theme::TEXT_MUTED)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
