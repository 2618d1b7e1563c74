//! Error types for the grounding pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors surfaced at the request boundary
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest mode is configured but the manifest file does not exist
    #[error("Source manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    /// Manifest exists but cannot be read as a table with a `url` column
    #[error("Invalid source manifest: {0}")]
    Manifest(String),

    /// Generation client failed to initialize at startup
    #[error("Generation client unavailable: {0}")]
    ClientUnavailable(String),

    /// Upstream generation backend failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// LLM backend call failed (provider level)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status code for this error at the request boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::ManifestMissing(_) => "manifest_missing",
            Error::Manifest(_) => "manifest_error",
            Error::ClientUnavailable(_) => "client_unavailable",
            Error::Generation(_) | Error::Llm(_) => "generation_error",
            Error::Validation(_) => "validation_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to end users
    fn public_message(&self) -> String {
        match self {
            Error::ManifestMissing(_) | Error::Manifest(_) => {
                "The document list for this service is not available.".to_string()
            }
            Error::ClientUnavailable(_) => {
                "The answer service is not configured; please try again later.".to_string()
            }
            Error::Generation(_) | Error::Llm(_) | Error::Http(_) => {
                "The answer service failed to respond; please try again later.".to_string()
            }
            Error::Validation(msg) => format!("Invalid request: {}", msg),
            Error::Json(err) => format!("Invalid request: {}", err),
            _ => "Internal error while processing the request.".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_type = self.error_type(), "{}", self);
        } else {
            tracing::debug!(error_type = self.error_type(), "{}", self);
        }

        let body = Json(json!({
            "resposta": self.public_message(),
            "error": self.error_type(),
        }));

        (status, body).into_response()
    }
}

/// Failure to retrieve one source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The per-source timeout elapsed
    #[error("timeout")]
    Timeout,
    /// The server answered with a non-success status
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// Connection, DNS, TLS or body read failure
    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Short machine-readable kind, embedded in context markers
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Network(_) => "network",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failure to extract text from fetched bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The document could not be parsed at all
    #[error("corrupt document: {0}")]
    Corrupt(String),
    /// Parsing succeeded but yielded no text
    #[error("document has no extractable text")]
    EmptyDocument,
}

impl ParseError {
    /// Short machine-readable kind, embedded in context markers
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::Corrupt(_) => "corrupt",
            ParseError::EmptyDocument => "empty_document",
        }
    }
}

/// Failure of the generation step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The client could not be constructed at startup
    #[error("client unavailable: {0}")]
    ClientUnavailable(String),
    /// The backend was reached but failed
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl From<GenerationError> for Error {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::ClientUnavailable(reason) => Error::ClientUnavailable(reason),
            GenerationError::Upstream(detail) => Error::Generation(detail),
        }
    }
}
