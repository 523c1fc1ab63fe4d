mod app;
mod logging;
mod state;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use rp_base::config::load_settings;
use rp_base::constants::STORE_DIR;
use rp_mod_github::MemoryHost;

use app::App;
use state::{Backend, State};

const USAGE: &str = "\
Usage: repo-pilot [--demo] [--help]

  --demo   run against an in-memory sample repository (any token logs in)
  --help   show this message

The GitHub token is read from the token file (config: token_file), then from
GITHUB_TOKEN in the environment or a .env file. Press l in the app to log in.";

fn main() -> io::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut demo = false;
    for arg in &args {
        match arg.as_str() {
            "--demo" => demo = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}\n\n{}", other, USAGE);
                std::process::exit(2);
            }
        }
    }

    // A missing .env is the normal case
    let _ = dotenvy::dotenv();

    let settings = load_settings();
    let _log_guard = logging::init(Path::new(&settings.log_dir));

    install_panic_hook();

    let backend = if demo { Backend::Demo(Arc::new(MemoryHost::demo())) } else { Backend::Github(settings.clone()) };
    tracing::info!(backend = backend.label(), workers = settings.max_workers, "starting UI");

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(State::new(settings, backend));
    let result = app.run(&mut terminal);

    // Cleanup
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "UI loop failed");
    }
    result
}

/// Restore the terminal and log the panic to disk. Without this, a panic
/// leaves the terminal in raw mode + alternate screen and the error is lost.
/// Worker panics are reported as failed tasks, so only the UI thread touches
/// the terminal.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let on_ui_thread = std::thread::current().name() == Some("main");
        if on_ui_thread {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }

        // Write panic info to .repo-pilot/errors/panic.log
        let error_dir = PathBuf::from(STORE_DIR).join("errors");
        let _ = std::fs::create_dir_all(&error_dir);
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let thread = std::thread::current().name().unwrap_or("unnamed").to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("[{}] thread '{}': {}\n\n{}\n\n---\n", ts, thread, info, backtrace);
        let log_path = error_dir.join("panic.log");
        let _ = std::fs::OpenOptions::new().create(true).append(true).open(&log_path).and_then(|mut f| {
            use std::io::Write;
            f.write_all(msg.as_bytes())
        });
        tracing::error!(thread = %thread, "panic: {}", info);

        if on_ui_thread {
            default_hook(info);
        }
    }));
}
