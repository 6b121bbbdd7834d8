//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! storage keys, and default endpoints so a rename only requires changing
//! this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "revu";

/// Crate version, as reported by `revu version` and `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple, exported by `build.rs`.
pub const TARGET: &str = env!("TARGET");

/// Local config filename (e.g. `.revu.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".revu.toml";

/// Directory name under `~/.config/` for global config and credentials.
pub const CONFIG_DIR: &str = "revu";

/// Credentials file name inside the config directory.
pub const CREDENTIALS_FILENAME: &str = "credentials.json";

/// Default listen address for `revu serve`.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Default server URL the client talks to.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Default GitHub REST API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Path of the review endpoint.
pub const REVIEW_ENDPOINT: &str = "/api/review";

/// Wall-clock ceiling for one review request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest accepted request deadline (one day).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Per-file and aggregate upload ceilings (50 MiB each).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 50 * 1024 * 1024;

// ── Credential storage keys ────────────────────────────────────────

pub const PROVIDER_KEY_STORAGE_KEY: &str = "provider_api_key";
pub const REPO_TOKEN_STORAGE_KEY: &str = "github_pat";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "REVU_PROVIDER";
pub const ENV_MODEL: &str = "REVU_MODEL";
pub const ENV_API_KEY: &str = "REVU_API_KEY";
pub const ENV_BASE_URL: &str = "REVU_BASE_URL";
pub const ENV_LISTEN: &str = "REVU_LISTEN";
pub const ENV_REQUEST_TIMEOUT: &str = "REVU_REQUEST_TIMEOUT";
pub const ENV_GITHUB_TOKEN: &str = "REVU_GITHUB_TOKEN";
pub const ENV_GITHUB_API_URL: &str = "REVU_GITHUB_API_URL";
pub const ENV_SERVER: &str = "REVU_SERVER";
