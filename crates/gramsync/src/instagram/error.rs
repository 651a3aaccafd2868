//! Error types for Instagram Graph API operations.

use thiserror::Error;

/// Errors raised by the Graph API client.
///
/// Every variant is a transport-level failure from the point of view of the
/// sync service: none of them are caught during pagination.
#[derive(Debug, Error)]
pub enum InstagramError {
    /// The request never produced a response (DNS, TLS, timeout, reset...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid client configuration (bad base URL, unbuildable transport).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Pull the human-readable message out of a Graph API error body.
///
/// Graph errors look like `{"error": {"message": "...", "type": "...", "code": 100}}`.
/// Anything else falls back to the raw body text.
pub(crate) fn error_message_from_body(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}
