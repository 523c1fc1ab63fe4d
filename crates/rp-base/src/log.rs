use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            LogLevel::Info => "·",
            LogLevel::Success => "✓",
            LogLevel::Warning => "!",
            LogLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String) -> Self {
        let timestamp_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0);
        Self { timestamp_ms, level, message }
    }

    /// Local wall-clock time of the entry as HH:MM:SS.
    pub fn time_label(&self) -> String {
        Local
            .timestamp_millis_opt(self.timestamp_ms as i64)
            .single()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string())
    }
}

/// Append-only log shown in the log pane.
#[derive(Debug, Default)]
pub struct LogBook {
    entries: Vec<LogEntry>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> &[LogEntry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }
}

/// Destination for progress messages produced off the UI thread.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: String);

    fn info(&self, message: String) {
        self.log(LogLevel::Info, message);
    }

    fn success(&self, message: String) {
        self.log(LogLevel::Success, message);
    }

    fn warn(&self, message: String) {
        self.log(LogLevel::Warning, message);
    }

    fn error(&self, message: String) {
        self.log(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_returns_newest_entries_in_order() {
        let mut book = LogBook::new();
        for i in 0..5 {
            book.push(LogEntry::new(LogLevel::Info, format!("m{}", i)));
        }
        let tail: Vec<&str> = book.tail(2).iter().map(|e| e.message.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(book.tail(10).len(), 5);
    }

    #[test]
    fn time_label_is_formatted() {
        let entry = LogEntry::new(LogLevel::Success, "done".to_string());
        assert_eq!(entry.time_label().len(), 8);
    }
}
