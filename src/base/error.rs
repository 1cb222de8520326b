use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the cookie store internals.
///
/// None of these escape [`CookieStore`](crate::cookies::store::CookieStore):
/// the public surface logs them and degrades to an empty or `false` result.
#[derive(Debug, Error)]
pub enum CookieError {
    // Backing store errors
    #[error("Backing store I/O failed for {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "json")]
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // Persisted format errors
    #[error("Unsupported cookie format version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("Persisted cookies truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("Unable to parse saved cookie: {0}")]
    MalformedEntry(String),

    // Caller input errors
    #[error("Invalid cookie record: {0}")]
    InvalidRecord(&'static str),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl CookieError {
    /// Create a storage error for `path`.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CookieError::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CookieError>;
