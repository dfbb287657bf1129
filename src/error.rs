/// Error types for the list core
///
/// Each concern gets its own enum so callers can tell a failed page load
/// (user-visible, retryable) apart from a failed artwork fetch (absorbed).

use std::io;
use thiserror::Error;

/// Failure while talking to the data provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (DNS, TLS, timeout, body read)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload did not have the expected shape
    #[error("Malformed response: {reason}")]
    Malformed { reason: String },
}

/// Failure while retrieving or decoding card artwork
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// The blocking worker panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failure while reading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
