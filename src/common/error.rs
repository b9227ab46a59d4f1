//! Error types for warmgate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Store Errors ===
    #[error("KV store error: {0}")]
    Kv(String),

    #[error("Cache store error: {0}")]
    Cache(String),

    // === Origin Errors ===
    #[error("Origin request failed: {0}")]
    Origin(String),

    #[error("Origin returned {status} for {url}")]
    OriginStatus { status: u16, url: String },

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Request Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Origin(_) | Error::Timeout(_) => true,
            // Origin 5xx is transient; 4xx means the request itself is wrong
            Error::OriginStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert to HTTP status code for gateway responses
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Origin(_) | Error::OriginStatus { .. } => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Origin(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_retryable() {
        assert!(Error::Origin("connection refused".into()).is_retryable());
        assert!(Error::Timeout("sitemap".into()).is_retryable());
        assert!(Error::OriginStatus {
            status: 503,
            url: "http://o/api/sitemap".into()
        }
        .is_retryable());
        assert!(!Error::OriginStatus {
            status: 404,
            url: "http://o/missing".into()
        }
        .is_retryable());
        assert!(!Error::InvalidRequest("bad body".into()).is_retryable());
        assert!(!Error::Kv("write failed".into()).is_retryable());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            Error::InvalidRequest("x".into()).to_http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Origin("x".into()).to_http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Timeout("x".into()).to_http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::Kv("x".into()).to_http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
