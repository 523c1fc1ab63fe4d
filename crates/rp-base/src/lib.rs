pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod log;
pub mod paths;
pub mod types;

pub use cancel::CancelToken;
pub use error::{BatchError, ErrorKind, HostError};
pub use log::{LogBook, LogEntry, LogLevel, LogSink};
