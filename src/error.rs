use reqwest::StatusCode;
use thiserror::Error;

use crate::sync::BatchOutcome;

/// Error types for a favsync run.
///
/// Fetch-phase errors (albums, tracks, skiplist) are fatal for the run. In the
/// write phase a batch that still fails after retries is recorded in the
/// [`RunReport`](crate::sync::RunReport); any other error stops liking with
/// [`SyncError::LikeAborted`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing, expired or rejected credentials (HTTP 401/403).
    ///
    /// Never retried. The user has to run `favsync auth` again.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Timeouts, connection drops, 5xx responses and 429 rate limiting.
    ///
    /// `retry_after` carries the `Retry-After` header in seconds when the service
    /// sent one.
    #[error("Transient network error: {message}")]
    Transient {
        message: String,
        retry_after: Option<u64>,
    },

    /// Any other non-success HTTP status (404, 400, ...).
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A paginated fetch could not be completed.
    ///
    /// A partial album or track listing cannot be trusted, so this aborts the run
    /// before any write happens.
    #[error("Fetching {what} failed: {reason}")]
    FatalFetch { what: String, reason: String },

    /// A like batch failed with an error that retrying cannot fix.
    ///
    /// `batches` holds the outcomes up to the failing batch; committed ones stay
    /// liked.
    #[error("Liking stopped at batch {batch}, {committed_tracks} tracks were liked before: {source}")]
    LikeAborted {
        batch: usize,
        committed_tracks: usize,
        batches: Vec<BatchOutcome>,
        source: Box<SyncError>,
    },

    /// The skiplist is missing the `spotify_id` column or contains a malformed row.
    #[error("Invalid skiplist file: {0}")]
    SkiplistFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Maps a non-success HTTP status to the matching error kind.
    pub fn from_status(status: StatusCode, retry_after: Option<u64>, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(format!(
                "{} {}",
                status.as_u16(),
                body.trim()
            )),
            StatusCode::TOO_MANY_REQUESTS => SyncError::Transient {
                message: format!("rate limited ({})", status.as_u16()),
                retry_after,
            },
            s if s.is_server_error() => SyncError::Transient {
                message: format!("server error {} {}", s.as_u16(), body.trim()),
                retry_after,
            },
            s => SyncError::Http {
                status: s.as_u16(),
                message: body.trim().to_string(),
            },
        }
    }

    /// Whether the retry policy may repeat the request that produced this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Transient { .. })
    }

    /// Server-provided delay hint, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            SyncError::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Turns an exhausted or failed page request into a fatal fetch error.
    ///
    /// Auth errors keep their kind so the CLI can point at `favsync auth`.
    pub fn into_fatal_fetch(self, what: &str) -> Self {
        match self {
            SyncError::Auth(_) | SyncError::FatalFetch { .. } | SyncError::LikeAborted { .. } => {
                self
            }
            other => SyncError::FatalFetch {
                what: what.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return SyncError::Transient {
                message: err.to_string(),
                retry_after: None,
            };
        }
        if err.is_decode() {
            return SyncError::Parse(err.to_string());
        }
        match err.status() {
            Some(status) => SyncError::from_status(status, None, err.to_string()),
            None => SyncError::Transient {
                message: err.to_string(),
                retry_after: None,
            },
        }
    }
}

impl From<csv::Error> for SyncError {
    fn from(err: csv::Error) -> Self {
        SyncError::SkiplistFormat(err.to_string())
    }
}
