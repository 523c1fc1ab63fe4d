//! Events posted from worker threads to the UI loop.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use rp_base::types::{FileContent, RemoteEntry, RepoSummary};
use rp_base::{LogEntry, LogLevel, LogSink};
use rp_mod_github::RepoHost;

/// Every UI-visible effect of a task. Applied by the UI loop only.
pub enum UiEvent {
    Log(LogEntry),
    LoggedIn { identity: String, host: Arc<dyn RepoHost> },
    LoginFailed,
    Repositories(Vec<RepoSummary>),
    Listing { repository: String, path: String, generation: u64, entries: Vec<RemoteEntry> },
    FileOpened { repository: String, entry: RemoteEntry, content: FileContent },
    FileSaved { repository: String, path: String },
    RepositoryCreated(RepoSummary),
    RepositoryDeleted(String),
    /// Files changed under `repository`; re-list if it is being browsed
    ContentsChanged { repository: String },
}

/// Sending half handed to every task. Also the task's log sink.
#[derive(Clone)]
pub struct UiPoster {
    tx: Sender<UiEvent>,
}

impl UiPoster {
    pub fn channel() -> (Self, Receiver<UiEvent>) {
        let (tx, rx) = channel();
        (Self { tx }, rx)
    }

    /// Post an event; a closed UI loop (shutdown) drops it silently.
    pub fn post(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

impl LogSink for UiPoster {
    fn log(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
        }
        self.post(UiEvent::Log(LogEntry::new(level, message)));
    }
}
