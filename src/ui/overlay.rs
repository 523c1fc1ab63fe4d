use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use super::{helpers::*, theme};
use crate::state::editor::Editor;
use crate::state::form::Form;
use crate::state::{Confirm, Overlay, State};

const FORM_WIDTH: u16 = 64;
const CONFIRM_WIDTH: u16 = 56;
/// Columns taken by the line-number gutter
const GUTTER: usize = 6;

pub fn render_overlay(frame: &mut Frame, state: &mut State, area: Rect) {
    match state.overlay.as_mut() {
        Some(Overlay::Form(form)) => render_form(frame, form, area),
        Some(Overlay::Confirm(confirm)) => render_confirm(frame, confirm, area),
        Some(Overlay::Editor(editor)) => render_editor(frame, editor, area),
        None => {}
    }
}

fn dialog_block(title: &str, border: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme::BG_ELEVATED))
        .title(Span::styled(format!(" {} ", title), Style::default().fg(border).bold()))
}

fn render_form(frame: &mut Frame, form: &Form, area: Rect) {
    // One row per field, a blank, and the error line
    let height = form.fields.len() as u16 + 4;
    let rect = centered_rect(area, FORM_WIDTH, height);
    frame.render_widget(Clear, rect);
    let block = dialog_block(form.kind.title(), theme::ACCENT);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let label_width = form.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
    let value_width = (inner.width as usize).saturating_sub(label_width + 5);
    let mut lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = i == form.selected;
            let mut value = field.display();
            if selected && form.selected_is_text() {
                value.push('▏');
            }
            // Keep the tail (where typing happens) visible
            let shown: String = {
                let chars: Vec<char> = value.chars().collect();
                chars[chars.len().saturating_sub(value_width)..].iter().collect()
            };
            let value_style = if selected {
                Style::default().fg(theme::TEXT).bg(theme::BG_INPUT)
            } else {
                Style::default().fg(theme::TEXT_SECONDARY)
            };
            Line::from(vec![
                Span::styled(if selected { " ▸ " } else { "   " }, Style::default().fg(theme::ACCENT)),
                Span::styled(format!("{:<w$}  ", field.label, w = label_width), Style::default().fg(theme::TEXT_MUTED)),
                Span::styled(shown, value_style),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(format!(" {}", error), Style::default().fg(theme::ERROR))));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_confirm(frame: &mut Frame, confirm: &Confirm, area: Rect) {
    let rect = centered_rect(area, CONFIRM_WIDTH, 6);
    frame.render_widget(Clear, rect);
    let block = dialog_block("Confirm", theme::ERROR);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let lines = vec![
        Line::from(Span::styled(confirm.prompt.clone(), Style::default().fg(theme::TEXT))),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y ", Style::default().fg(theme::BG_BASE).bg(theme::ERROR).bold()),
            Span::styled(" delete   ", Style::default().fg(theme::TEXT_MUTED)),
            Span::styled(" n ", Style::default().fg(theme::BG_BASE).bg(theme::TEXT_MUTED).bold()),
            Span::styled(" cancel", Style::default().fg(theme::TEXT_MUTED)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_editor(frame: &mut Frame, editor: &mut Editor, area: Rect) {
    let rect = Rect::new(
        area.x + 2,
        area.y + 1,
        area.width.saturating_sub(4),
        area.height.saturating_sub(2),
    );
    frame.render_widget(Clear, rect);

    let mut title = format!("{}/{}", editor.repository, editor.entry.path);
    if editor.is_read_only() {
        title.push_str(" (binary, read-only)");
    } else if editor.modified {
        title.push_str(" ●");
    }
    let block = dialog_block(&title, theme::ACCENT);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    if editor.is_read_only() {
        let size = editor.entry.size.map(format_size).unwrap_or_default();
        let text = format!(" Binary file {} cannot be shown. Esc to close.", size);
        frame.render_widget(Paragraph::new(Span::styled(text, Style::default().fg(theme::TEXT_MUTED))), inner);
        return;
    }

    let height = inner.height as usize;
    if height == 0 {
        return;
    }
    editor.scroll_into_view(height);
    let text_width = (inner.width as usize).saturating_sub(GUTTER);

    let lines: Vec<Line> = editor
        .lines()
        .iter()
        .enumerate()
        .skip(editor.scroll)
        .take(height)
        .map(|(i, line)| {
            let line = line.replace('\t', "    ");
            Line::from(vec![
                Span::styled(format!(" {:4} ", i + 1), Style::default().fg(theme::TEXT_MUTED).bg(theme::BG_BASE)),
                Span::styled(truncate_string(&line, text_width), Style::default().fg(theme::TEXT)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)), inner);

    // Terminal cursor at the edit position; tabs render four wide
    let before: String = editor.lines().get(editor.row).map(|l| l.chars().take(editor.col).collect()).unwrap_or_default();
    let col = unicode_width::UnicodeWidthStr::width(before.replace('\t', "    ").as_str());
    if col < text_width {
        let x = inner.x + (GUTTER + col) as u16;
        let y = inner.y + (editor.row - editor.scroll) as u16;
        frame.set_cursor_position(Position::new(x, y));
    }
}
