//! Error types for card_resolver

use std::fmt;

/// Unified error type for resolution and persistence operations
#[derive(Debug)]
pub enum Error {
    /// HTTP request failed (network error, timeout, connection refused)
    Network(reqwest::Error),
    /// Failed to parse a JSON payload
    Parse(serde_json::Error),
    /// Provider returned an error status code (5xx and other non-miss statuses)
    HttpStatus(reqwest::StatusCode),
    /// Database operation failed
    Database(rusqlite::Error),
    /// Failed to fetch image bytes from a URL
    ImageFetchFailed(String),
}

impl Error {
    /// Whether this error represents a transient provider failure
    /// (the caller may retry later; the resolution chain is aborted).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::HttpStatus(status) => status.is_server_error(),
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network(e) => write!(f, "Network error: {}", e),
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            Error::Database(e) => write!(f, "Database error: {}", e),
            Error::ImageFetchFailed(url) => write!(f, "Failed to fetch image from: {}", url),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Network(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Database(e) => Some(e),
            Error::HttpStatus(_) => None,
            Error::ImageFetchFailed(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

/// Result alias for card_resolver operations
pub type Result<T> = std::result::Result<T, Error>;
