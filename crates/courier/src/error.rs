//! Error types for request construction and transport.

/// Broad classification of a [`NetworkError`].
///
/// Builder failures are always [`ErrorKind::Configuration`]; transport
/// failures fall into the remaining kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request or transport was configured incorrectly.
    Configuration,
    /// The transport channel could not be established.
    Connection,
    /// A read or write failed mid-transfer.
    Io,
    /// A deadline elapsed while the caller was suspended.
    Timeout,
    /// The transport was already closed.
    Closed,
}

/// Errors produced while building or sending a request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Missing or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request method is missing or not supported.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// An upload file could not be read.
    #[error("Upload error: {0}")]
    Upload(String),

    /// The compression function failed.
    #[error("Compression error: {0}")]
    Compression(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Operation timed out.
    #[error("Operation timed out")]
    Timeout,

    /// Operation attempted on a closed transport.
    #[error("Transport is closed")]
    Closed,
}

impl NetworkError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_)
            | Self::InvalidMethod(_)
            | Self::InvalidUrl(_)
            | Self::InvalidHeader(_)
            | Self::Upload(_)
            | Self::Compression(_)
            | Self::Json(_) => ErrorKind::Configuration,
            Self::Connection(_) | Self::Tls(_) => ErrorKind::Connection,
            Self::Io(_) => ErrorKind::Io,
            Self::Timeout => ErrorKind::Timeout,
            Self::Closed => ErrorKind::Closed,
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
