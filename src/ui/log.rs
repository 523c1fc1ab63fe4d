use ratatui::{prelude::*, widgets::Paragraph};

use super::{helpers::*, theme};
use crate::state::State;

/// Newest entries at the bottom; older ones scroll off the top.
pub fn render_log(frame: &mut Frame, state: &State, area: Rect) {
    let block = panel_block(format!("Log ({})", state.logs.len()), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let lines: Vec<Line> = state
        .logs
        .tail(inner.height as usize)
        .iter()
        .map(|entry| {
            let color = theme::level_color(entry.level);
            Line::from(vec![
                Span::styled(format!(" {} ", entry.time_label()), Style::default().fg(theme::TEXT_MUTED)),
                Span::styled(format!("{} ", entry.level.icon()), Style::default().fg(color)),
                Span::styled(truncate_string(&entry.message, width.saturating_sub(13)), Style::default().fg(color)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
