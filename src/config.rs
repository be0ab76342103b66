//! Configuration management for favsync.
//!
//! Values are read from environment variables. A `.env` file in the local data
//! directory (`<local-data>/favsync/.env`) is loaded first, so the variables can
//! live there instead of in the shell profile:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use crate::error::SyncError;

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_SCOPE: &str = "user-library-read user-library-modify";

/// Scope needed to list saved albums and check liked tracks.
pub const READ_SCOPE: &str = "user-library-read";

/// Scope needed to like tracks.
pub const MODIFY_SCOPE: &str = "user-library-modify";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum number of items the Spotify API returns per page.
pub const PAGE_LIMIT: u32 = 50;

/// Maximum number of IDs the Spotify API accepts per check/save call.
pub const BATCH_LIMIT: usize = 50;

/// Loads environment variables from `<local-data>/favsync/.env`.
///
/// Creates the directory if it doesn't exist. A missing `.env` file is not an
/// error since every value can also come from the environment.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the `.env` file exists
/// but cannot be parsed.
pub async fn load_env() -> Result<(), SyncError> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| SyncError::Config(e.to_string()))?;
    }
    Ok(())
}

/// Root of everything favsync stores locally, e.g. `~/.local/share/favsync`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("favsync");
    path
}

/// Address the OAuth callback server binds to (`SERVER_ADDRESS`).
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Client ID of the registered Spotify application (`SPOTIFY_API_AUTH_CLIENT_ID`).
///
/// # Errors
///
/// Returns [`SyncError::Config`] if the variable is unset or empty.
pub fn spotify_client_id() -> Result<String, SyncError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// OAuth redirect URI (`SPOTIFY_API_REDIRECT_URI`). Must match the app settings.
pub fn spotify_redirect_uri() -> String {
    var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI)
}

/// Requested OAuth scopes (`SPOTIFY_API_AUTH_SCOPE`).
///
/// `read_only` requests only [`READ_SCOPE`], which is enough for dry runs.
pub fn spotify_scope(read_only: bool) -> String {
    if read_only {
        return READ_SCOPE.to_string();
    }
    var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

pub fn spotify_apiauth_url() -> String {
    var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
}

pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Skiplist used when `--skiplist-file` is not given (`FAVSYNC_SKIPLIST`).
///
/// Defaults to `<local-data>/favsync/skiplist.csv`.
pub fn default_skiplist_path() -> PathBuf {
    match env::var("FAVSYNC_SKIPLIST") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => data_dir().join("skiplist.csv"),
    }
}

/// Per-request timeout (`FAVSYNC_HTTP_TIMEOUT_SECS`).
pub fn http_timeout() -> Duration {
    let secs = env::var("FAVSYNC_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

fn var_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn required(name: &str) -> Result<String, SyncError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(SyncError::Config(format!(
            "{name} must be set (environment or {})",
            data_dir().join(".env").display()
        ))),
    }
}
