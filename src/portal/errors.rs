//! Error types for the course portal client.

use reqwest::StatusCode;

use crate::extract::ExtractError;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request failed")]
    Network(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("evaluation session is invalid or expired (redirected from {url})")]
    InvalidSession { url: String },
    #[error("failed to parse page {url}")]
    Parse {
        url: String,
        #[source]
        source: ExtractError,
    },
}

impl ScrapeError {
    pub fn parse(url: &str, source: ExtractError) -> Self {
        Self::Parse {
            url: url.to_string(),
            source,
        }
    }

    /// Whether another attempt at the same unit of work could succeed.
    ///
    /// Client errors other than timeouts and throttling describe a resource
    /// that will not appear on retry. A request that could not be built
    /// (malformed URL) fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => !e.is_builder(),
            Self::Parse { source, .. } => source.is_retryable(),
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::InvalidSession { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ScrapeError {
        ScrapeError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            url: "https://courses.rice.edu/".to_string(),
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(408).is_retryable());
        assert!(status(429).is_retryable());
    }

    #[test]
    fn test_missing_resource_is_terminal() {
        assert!(!status(404).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(!status(410).is_retryable());
    }

    #[test]
    fn test_parse_failure_is_retryable() {
        let err = ScrapeError::parse("u", ExtractError::MissingElement("course heading"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_url_without_term_is_terminal() {
        assert!(!ScrapeError::parse("u", ExtractError::MissingTerm).is_retryable());
    }

    #[test]
    fn test_heading_without_crn_is_terminal() {
        let err = ScrapeError::parse(
            "u",
            ExtractError::MissingCrn {
                heading: "COMP 140 - COMPUTATIONAL THINKING".to_string(),
            },
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_session_is_terminal() {
        let err = ScrapeError::InvalidSession {
            url: "https://esther.rice.edu/".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
