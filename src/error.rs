//! Error taxonomy for the Datadog API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Placeholder substituted for credentials in error messages.
pub const REDACTED: &str = "redacted";

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to build request: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Retryable status that was still observed when retries ran out.
    #[error("received HTTP status code {}", .0.as_u16())]
    UnexpectedStatus(StatusCode),

    #[error("API error {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// 2xx response whose envelope reported `"status": "error"`.
    #[error("API returned error: {0}")]
    Api(String),

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Message of another error with credentials scrubbed.
    #[error("{0}")]
    Redacted(String),
}

impl Error {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus(status) | Error::Status { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Replace every occurrence of each key in the error message with
/// [`REDACTED`]. The URL-encoded form of a key is scrubbed too, since keys
/// travel in the query string.
///
/// When nothing was replaced the original error is returned untouched so
/// callers can still match on its variant.
pub fn redact_keys(err: Error, keys: &[&str]) -> Error {
    let original = err.to_string();
    let mut message = original.clone();
    for key in keys.iter().copied().filter(|k| !k.is_empty()) {
        message = message.replace(key, REDACTED);
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        if encoded != key {
            message = message.replace(&encoded, REDACTED);
        }
    }
    if message == original {
        return err;
    }
    Error::Redacted(message)
}
