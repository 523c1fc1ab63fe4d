//! Error taxonomy shared by every remote operation.

use std::io;

/// Failure class of a [`HostError`], used to decide whether a batch may skip an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    NotFound,
    Conflict,
    Validation,
    Transport,
    Decode,
    Api,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("'{0}' is not valid UTF-8 text")]
    Decode(String),
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Api { .. } => ErrorKind::Api,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether a batch may log this per-item failure and move on.
    pub fn is_item_skippable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::Conflict)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Map an HTTP status and server message onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => Self::Validation(message),
            _ => Self::Api { status, message },
        }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Re-class a Validation error as Conflict. The contents API answers 422
    /// both for "path already exists" and for "sha does not match".
    pub fn validation_as_conflict(self) -> Self {
        match self {
            Self::Validation(message) => Self::Conflict(message),
            other => other,
        }
    }
}

/// Outcome of a batch that did not run to completion.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("{source} (aborted after {completed} item(s))")]
    Aborted {
        completed: usize,
        #[source]
        source: HostError,
    },
    #[error("cancelled after {completed} item(s)")]
    Cancelled { completed: usize },
}

impl BatchError {
    pub fn completed(&self) -> usize {
        match self {
            Self::Aborted { completed, .. } | Self::Cancelled { completed } => *completed,
        }
    }
}
