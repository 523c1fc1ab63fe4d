use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, BorderType, Borders};
use unicode_width::UnicodeWidthStr;

use super::theme;

const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

/// Human-readable byte count (B, K, M, G).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "K", "M", "G"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 { format!("{}{}", bytes, UNITS[0]) } else { format!("{:.1}{}", value, UNITS[unit]) }
}

pub fn spinner(frame: u64) -> char {
    SPINNER_FRAMES[(frame % SPINNER_FRAMES.len() as u64) as usize]
}

/// Rect of `width` x `height` centered in `area`, clamped to it.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))]).flex(Flex::Center).areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))]).flex(Flex::Center).areas(row);
    rect
}

/// Rounded panel block; the focused panel gets the accent border.
pub fn panel_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused { theme::BORDER_FOCUS } else { theme::BORDER };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme::BG_SURFACE))
        .title(ratatui::text::Span::styled(
            format!(" {} ", title),
            Style::default().fg(if focused { theme::ACCENT } else { theme::TEXT_SECONDARY }),
        ))
}

/// First index to draw so that `selected` stays inside `height` rows.
pub fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 { 0 } else { selected.saturating_sub(height - 1) }
}
