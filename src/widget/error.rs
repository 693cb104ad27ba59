//! Error types for the widget transport.

use thiserror::Error;

/// Failure of one request/response round trip.
///
/// The widget renders these through `Display`, prefixed with `"Error: "`.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed (connect, send, or body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with an error body instead of a reply.
    #[error("{0}")]
    Server(String),
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
