use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::event;
use ratatui::prelude::*;

use rp_base::constants::{IDLE_POLL_MS, RENDER_THROTTLE_MS, SPINNER_INTERVAL_MS};
use rp_base::{LogEntry, LogLevel};

use crate::app::actions::{Action, ActionResult, Request, apply_action};
use crate::app::dispatch::Dispatcher;
use crate::app::events::handle_event;
use crate::app::inbox::{apply_event, panicked_task};
use crate::app::messages::{UiEvent, UiPoster};
use crate::app::tasks;
use crate::state::{State, token_store};
use crate::ui;

/// Event poll while something is moving (tasks running or a redraw pending)
const ACTIVE_POLL_MS: u64 = 8;

pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

pub struct App {
    pub state: State,
    dispatcher: Dispatcher,
    rx: Receiver<UiEvent>,
    /// Last render time for throttling
    last_render_ms: u64,
    /// Last spinner animation update time
    last_spinner_ms: u64,
    /// Last dispatcher liveness check
    last_poll_ms: u64,
}

impl App {
    pub fn new(state: State) -> Self {
        let (ui, rx) = UiPoster::channel();
        let dispatcher = Dispatcher::new(state.settings.max_workers, ui);
        Self { state, dispatcher, rx, last_render_ms: 0, last_spinner_ms: 0, last_poll_ms: 0 }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        self.startup_login();

        loop {
            let current_ms = now_ms();

            // === INPUT FIRST: Process user input with minimal latency ===
            if event::poll(Duration::ZERO)? {
                let evt = event::read()?;
                let Some(action) = handle_event(&evt, &self.state) else {
                    let flagged = self.dispatcher.cancel_all();
                    tracing::info!(in_flight = flagged, "quit requested");
                    break;
                };
                self.handle_action(action);

                // Render immediately after input for instant feedback
                if self.state.dirty {
                    terminal.draw(|frame| ui::render(frame, &mut self.state))?;
                    self.state.dirty = false;
                    self.last_render_ms = current_ms;
                }
            }

            // === BACKGROUND PROCESSING ===
            self.process_ui_events();
            if current_ms.saturating_sub(self.last_poll_ms) >= self.state.settings.poll_interval_ms {
                self.last_poll_ms = current_ms;
                self.poll_tasks();
            }
            self.update_spinner_animation(current_ms);

            // Render if dirty and enough time has passed
            if self.state.dirty && current_ms.saturating_sub(self.last_render_ms) >= RENDER_THROTTLE_MS {
                terminal.draw(|frame| ui::render(frame, &mut self.state))?;
                self.state.dirty = false;
                self.last_render_ms = current_ms;
            }

            let poll_ms = if self.state.busy || self.state.dirty { ACTIVE_POLL_MS } else { IDLE_POLL_MS };
            let _ = event::poll(Duration::from_millis(poll_ms))?;
        }

        Ok(())
    }

    /// Log in with a stored or environment token, if there is one.
    fn startup_login(&mut self) {
        let Some((token, source)) = token_store::startup_token(&self.state.settings.token_path()) else {
            self.log(LogLevel::Info, "Press l to log in".to_string());
            return;
        };
        self.log(LogLevel::Info, format!("Logging in with the token from {}", source.describe()));
        // Keep the file exactly as it is: rewrite a file token, never write an env one
        let save_token = source == token_store::TokenSource::File;
        self.dispatch(Request::Login { token, save_token });
    }

    fn handle_action(&mut self, action: Action) {
        match apply_action(&mut self.state, action) {
            ActionResult::Nothing => {}
            ActionResult::Dispatch(request) => self.dispatch(request),
            ActionResult::CancelTasks => {
                let flagged = self.dispatcher.cancel_all();
                let message = if flagged == 0 {
                    "Nothing to cancel".to_string()
                } else {
                    format!("Cancelling {} task(s)", flagged)
                };
                self.log(LogLevel::Warning, message);
            }
        }
        self.sync_busy();
    }

    fn dispatch(&mut self, request: Request) {
        tasks::dispatch(&mut self.dispatcher, &mut self.state, request);
        self.sync_busy();
    }

    /// Drain worker events; follow-up requests skip the busy gate.
    fn process_ui_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            for request in apply_event(&mut self.state, event) {
                self.dispatch(request);
            }
        }
    }

    fn poll_tasks(&mut self) {
        for completion in self.dispatcher.poll() {
            if completion.panicked {
                panicked_task(&mut self.state, &completion.label);
            }
        }
        self.sync_busy();
    }

    fn sync_busy(&mut self) {
        let busy = self.dispatcher.is_busy();
        let labels: Vec<String> = self.dispatcher.running_labels().into_iter().map(str::to_string).collect();
        if busy != self.state.busy || labels != self.state.running_labels {
            self.state.busy = busy;
            self.state.running_labels = labels;
            self.state.dirty = true;
        }
    }

    fn update_spinner_animation(&mut self, current_ms: u64) {
        if !self.state.busy {
            return;
        }
        if current_ms.saturating_sub(self.last_spinner_ms) >= SPINNER_INTERVAL_MS {
            self.last_spinner_ms = current_ms;
            self.state.spinner_frame = self.state.spinner_frame.wrapping_add(1);
            self.state.dirty = true;
        }
    }

    fn log(&mut self, level: LogLevel, message: String) {
        tracing::info!("{}", message);
        self.state.logs.push(LogEntry::new(level, message));
        self.state.dirty = true;
    }
}
