//! Unified error types for tilecache.
//!
//! None of these cross the cascade boundary as `Err` values: the store
//! downgrades them to miss responses and the network source folds them into
//! [`ResponseError`]s.

use std::path::PathBuf;

use crate::response::{ErrorReason, ResponseError};
use tokio_rusqlite::rusqlite;

/// Unified error type for the tilecache crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The package could not be opened (bad path, unreadable, not SQLite).
    #[error("STORE_OPEN_FAILED: {}: {reason}", path.display())]
    StoreOpenFailure { path: PathBuf, reason: String },

    /// A lookup query failed.
    #[error("QUERY_FAILED: {0}")]
    QueryFailure(tokio_rusqlite::Error),

    /// A compressed payload could not be inflated.
    #[error("DECOMPRESSION_FAILED: {0}")]
    DecompressionFailure(String),

    /// The resource URL could not be parsed.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure talking to the network source.
    #[error("CONNECTION_ERROR: {0}")]
    Connection(String),

    /// Non-success HTTP status.
    #[error("HTTP_ERROR: status {0}")]
    HttpStatus(u16),

    /// Response body larger than the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    TooLarge(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::QueryFailure(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::QueryFailure(tokio_rusqlite::Error::Close(c)),
            _ => Error::QueryFailure(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::QueryFailure(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::QueryFailure(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for ResponseError {
    fn from(err: Error) -> Self {
        let reason = match &err {
            Error::HttpStatus(404) => ErrorReason::NotFound,
            Error::HttpStatus(429) => ErrorReason::RateLimit,
            Error::HttpStatus(_) => ErrorReason::Server,
            Error::Connection(_) => ErrorReason::Connection,
            Error::StoreOpenFailure { .. }
            | Error::QueryFailure(_)
            | Error::DecompressionFailure(_)
            | Error::InvalidUrl(_)
            | Error::TooLarge(_) => ErrorReason::Other,
        };

        ResponseError { reason, message: err.to_string() }
    }
}
