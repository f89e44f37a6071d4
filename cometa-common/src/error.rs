//! Error types for the Cometa device client

use thiserror::Error;

/// Main error type for Cometa client operations
#[derive(Error, Debug)]
pub enum CometaError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed wire data (bad chunk framing, bad HTTP response, ...)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Handshake rejected, signature mismatch, or relay returned 403
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Bad caller-supplied parameter (length caps, missing app-server triple)
    #[error("parameter error: {0}")]
    Parameter(String),

    /// TLS configuration or verification failure
    #[error("TLS error: {0}")]
    Tls(String),

    /// DNS resolution or connect failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// No response within the expected time
    #[error("timeout: {0}")]
    Timeout(String),

    /// Session is not in a state that allows the requested operation
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CometaError>;

/// The library's return code, equivalent to the C library's `cometa_reply`.
///
/// This is what crosses the public API boundary; callers inspect this
/// instead of matching on [`CometaError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    /// Operation succeeded
    Ok,
    /// No response within the expected time
    Timeout,
    /// A read or write to the relay or app server failed
    NetError,
    /// The HTTP response from a peer could not be parsed
    HttpError,
    /// Handshake rejected, signature mismatch, or relay returned 403
    AuthError,
    /// Bad caller-supplied parameter
    ParError,
    /// Any other failure (DNS, connect, all-ensemble-candidates-failed, ...)
    Error,
}

impl From<&CometaError> for ReplyCode {
    fn from(err: &CometaError) -> Self {
        match err {
            CometaError::Io(_) => ReplyCode::NetError,
            CometaError::Protocol(_) => ReplyCode::HttpError,
            CometaError::Authentication(_) => ReplyCode::AuthError,
            CometaError::Parameter(_) => ReplyCode::ParError,
            CometaError::Tls(_) => ReplyCode::NetError,
            CometaError::Connection(_) => ReplyCode::Error,
            CometaError::Timeout(_) => ReplyCode::Timeout,
            CometaError::InvalidState(_) => ReplyCode::Error,
        }
    }
}

impl From<CometaError> for ReplyCode {
    fn from(err: CometaError) -> Self {
        ReplyCode::from(&err)
    }
}
