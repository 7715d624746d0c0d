//! Error types for the web preview adapter

use std::time::Duration;

/// A single page request failed
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// Server-requested wait from a `Retry-After` header
        retry_after: Option<Duration>,
    },
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("read timeout ({0:?} with no response)")]
    Timeout(Duration),
}

impl FetchError {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: e.to_string(),
                retry_after: None,
            },
            None => Self::Transport(e.to_string()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting, server errors, network failures and stalls are transient
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Transport(_) | Self::Timeout(_) => true,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Failure while setting up a [`crate::TelegramSource`]
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            message: "test".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn rate_limit_and_server_errors_retryable() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn client_errors_not_retryable() {
        assert!(!status(404).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn network_and_timeout_retryable() {
        assert!(FetchError::Transport("connection refused".into()).is_retryable());
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_retryable());
    }

    #[test]
    fn display() {
        assert_eq!(status(404).to_string(), "HTTP 404: test");
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(10)).to_string(),
            "read timeout (10s with no response)"
        );
    }
}
