//! Error types for DICOMweb client operations.
//!
//! Every fallible operation in this crate returns [`Result<T>`], an alias over
//! [`DicomwebError`]. The variants fall into three groups:
//!
//! | Group | Variants | Detected |
//! |-------|----------|----------|
//! | Validation | `MissingQueryType`, `InvalidRequestShape`, `Config` | before any network call |
//! | Remote | `RemoteError`, `MalformedContentType`, `UnsupportedContentType`, `MalformedMultipart`, `Json` | after the response arrives |
//! | Transport | `Transport`, `Hook` | while building or sending the request |
//!
//! Validation errors are always recoverable by correcting the request. Remote and
//! transport errors are propagated unchanged; nothing is retried and a multipart
//! decode that fails partway through returns no partial result.

use thiserror::Error;

/// Result type alias for DICOMweb operations
pub type Result<T> = std::result::Result<T, DicomwebError>;

/// Errors produced while routing, transmitting or transcoding DICOMweb requests.
#[derive(Error, Debug)]
pub enum DicomwebError {
    /// A QIDO request was issued without a query level.
    #[error("failed to query: need to specify query type")]
    MissingQueryType,

    /// A request does not carry the identifiers its kind requires.
    #[error("parameters do not match the given type: {0}")]
    InvalidRequestShape(String),

    /// The server answered with a non-2xx status.
    #[error("{status_line}")]
    RemoteError {
        /// Numeric status code
        status: u16,
        /// Status line, e.g. `500 Internal Server Error`
        status_line: String,
    },

    /// The `Content-Type` header is missing, unparsable or lacks a boundary.
    #[error("malformed content type: {0}")]
    MalformedContentType(String),

    /// The response body has a media type this client refuses to decode.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Framing error while splitting a multipart body into parts.
    #[error("malformed multipart body: {0}")]
    MalformedMultipart(String),

    /// Connection failure, invalid URL or any other error from the HTTP layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// A request hook aborted the request.
    #[error("request hook failed: {0}")]
    Hook(String),

    /// A JSON response body could not be decoded.
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// The client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DicomwebError {
    /// Create a new hook error
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Create a new multipart framing error
    pub fn malformed_multipart(msg: impl Into<String>) -> Self {
        Self::MalformedMultipart(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error was raised before any network traffic happened
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DicomwebError::MissingQueryType
                | DicomwebError::InvalidRequestShape(_)
                | DicomwebError::Config(_)
        )
    }

    /// HTTP status code carried by a [`DicomwebError::RemoteError`]
    pub fn status(&self) -> Option<u16> {
        match self {
            DicomwebError::RemoteError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DicomwebError {
    fn from(err: reqwest::Error) -> Self {
        DicomwebError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for DicomwebError {
    fn from(err: url::ParseError) -> Self {
        DicomwebError::Transport(format!("invalid URL: {}", err))
    }
}

impl From<toml::de::Error> for DicomwebError {
    fn from(err: toml::de::Error) -> Self {
        DicomwebError::Config(err.to_string())
    }
}
