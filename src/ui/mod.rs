mod browser;
mod helpers;
mod log;
mod overlay;
mod repos;
mod status;
mod theme;

use ratatui::{prelude::*, widgets::Block};

use rp_base::constants::{LOG_PANE_HEIGHT, REPO_LIST_WIDTH};

use crate::state::State;

pub fn render(frame: &mut Frame, state: &mut State) {
    let area = frame.area();

    // Fill base background
    frame.render_widget(Block::default().style(Style::default().bg(theme::BG_BASE)), area);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),               // Header
            Constraint::Min(3),                  // Body
            Constraint::Length(LOG_PANE_HEIGHT), // Log pane
            Constraint::Length(1),               // Status bar
        ])
        .split(area);

    render_header(frame, state, main_layout[0]);
    render_body(frame, state, main_layout[1]);
    log::render_log(frame, state, main_layout[2]);
    status::render_status_bar(frame, state, main_layout[3]);

    overlay::render_overlay(frame, state, area);
}

fn render_header(frame: &mut Frame, state: &State, area: Rect) {
    let base_style = Style::default().bg(theme::BG_BASE);
    let account = match state.session.identity() {
        Some(identity) => Span::styled(format!(" {} ", identity), Style::default().fg(theme::SUCCESS)),
        None => Span::styled(" not logged in ", Style::default().fg(theme::TEXT_MUTED)),
    };
    let line = Line::from(vec![
        Span::styled(" repo-pilot ", Style::default().fg(theme::BG_BASE).bg(theme::ACCENT).bold()),
        Span::styled(format!(" {} ", state.backend.label()), Style::default().fg(theme::TEXT_MUTED)),
        account,
    ]);
    frame.render_widget(ratatui::widgets::Paragraph::new(line).style(base_style), area);
}

fn render_body(frame: &mut Frame, state: &State, area: Rect) {
    let body_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(REPO_LIST_WIDTH), // Repositories
            Constraint::Min(1),                  // Browser
        ])
        .split(area);

    repos::render_repos(frame, state, body_layout[0]);
    browser::render_browser(frame, state, body_layout[1]);
}
