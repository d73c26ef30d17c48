//! Error types for the claude-usage crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading credentials from a store.
///
/// [`fetch_credential`](crate::credentials::fetch_credential) folds every
/// variant into "not authenticated"; the variants exist so that callers and
/// logs can still tell a missing entry from a corrupted one.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No entry exists under the requested service name.
    #[error("Claude Code credentials not found. Run `claude` to login.")]
    NotFound,

    /// The stored bytes are not a decodable credential payload.
    #[error("Failed to decode credentials: {0}")]
    Decode(String),

    /// I/O error when reading the backing store.
    #[error("I/O error reading credentials: {0}")]
    Io(String),
}

/// Errors returned by the usage API client.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// The server rejected the bearer token (HTTP 401).
    #[error("Token expired. Run 'claude login'")]
    Unauthorized,

    /// Any other non-200 status.
    #[error("HTTP error {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Value of the `retry-after` header, when the server sent one.
        retry_after: Option<String>,
    },

    /// No usable response: connection failure, timeout, or a 200 body that
    /// could not be decoded.
    #[error("{0}")]
    Transport(String),
}

/// Errors that can occur when loading the local statistics cache.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The file exists but could not be read.
    #[error("Failed to read stats file {path}")]
    Io {
        /// Path of the stats file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid stats JSON.
    #[error("Failed to decode stats file {path}: {message}")]
    Decode {
        /// Path of the stats file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
}

/// Top-level error for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential retrieval failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Usage API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local stats could not be loaded.
    #[error(transparent)]
    Stats(#[from] StatsError),
}
