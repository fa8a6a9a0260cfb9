//! Error types for client and cache operations.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the backend.
///
/// Stored data is never a source of errors: a corrupt cache bucket reads as
/// empty, a corrupt session record reads as [`Error::NotLoggedIn`].
#[derive(Error, Debug)]
pub enum Error {
    /// No session record is present but the request requires one.
    ///
    /// Raised before any network dispatch happens.
    #[error("not logged in")]
    NotLoggedIn,

    /// A request failed, either with a non-success HTTP status or on the
    /// network level (in which case `status` is `None`).
    #[error("{}", transport_display(.status, .message))]
    Transport {
        /// HTTP status code, if a response was received.
        status: Option<u16>,
        /// Response body or underlying error description.
        message: String,
    },

    /// A response payload did not match the type requested by the caller.
    #[error("failed to decode response payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Create a transport error from an HTTP status and response body.
    pub fn status<S: Into<String>>(status: u16, message: S) -> Self {
        Error::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this error means the server no longer knows the resource
    /// (404 or 410).
    pub fn is_gone(&self) -> bool {
        matches!(self.http_status(), Some(404) | Some(410))
    }
}

fn transport_display(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("transport error (status {status}): {message}"),
        None => format!("transport error: {message}"),
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
