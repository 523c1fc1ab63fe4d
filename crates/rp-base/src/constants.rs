// =============================================================================
// STORAGE
// =============================================================================

/// Directory holding local config, logs and crash reports
pub const STORE_DIR: &str = ".repo-pilot";

/// Shared configuration file inside STORE_DIR
pub const CONFIG_FILE: &str = "config.json";

/// Default plaintext token file, relative to the working directory
pub const DEFAULT_TOKEN_FILE: &str = "github_token.txt";

/// Environment variable consulted when no token file exists
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

// =============================================================================
// GITHUB API
// =============================================================================

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub const API_VERSION: &str = "2022-11-28";

pub const USER_AGENT: &str = concat!("repo-pilot/", env!("CARGO_PKG_VERSION"));

/// Page size for paginated listings (GitHub maximum)
pub const PER_PAGE: usize = 100;

/// GitHub's repository name length limit
pub const MAX_REPO_NAME_LEN: usize = 100;

// =============================================================================
// DISPATCH
// =============================================================================

/// Upper bound on concurrently running worker threads
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// How often the UI loop checks worker liveness (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// =============================================================================
// UI
// =============================================================================

/// Render throttle for background-driven redraws (~28fps)
pub const RENDER_THROTTLE_MS: u64 = 36;

/// Spinner animation frame interval
pub const SPINNER_INTERVAL_MS: u64 = 100;

/// Idle event poll timeout
pub const IDLE_POLL_MS: u64 = 50;

/// Height of the log pane including borders
pub const LOG_PANE_HEIGHT: u16 = 10;

/// Width of the repository list including borders
pub const REPO_LIST_WIDTH: u16 = 40;
