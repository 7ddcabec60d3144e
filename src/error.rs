use std::time::Duration;

use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Accessibility audit failed: {0}")]
    Audit(String),

    #[error("Scan timeout after {0:?}")]
    GlobalTimeout(Duration),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ScanError {
    /// Whether this failure is reported to the caller as a gateway timeout.
    ///
    /// Classification follows the error text, not the variant: a navigation
    /// or driver failure whose message mentions a timeout is reported the
    /// same way as the global budget elapsing.
    pub fn is_timeout(&self) -> bool {
        self.to_string().to_ascii_lowercase().contains("timeout")
    }

    /// Whether the request was rejected before any browser work started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScanError::MissingUrl | ScanError::InvalidUrl(_) | ScanError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_timeout_classifies_as_timeout() {
        let err = ScanError::GlobalTimeout(Duration::from_secs(30));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn navigation_timeout_classifies_by_message() {
        let err = ScanError::Navigation("Navigation timeout of 45000 ms exceeded".to_string());
        assert!(err.is_timeout());

        let err = ScanError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string());
        assert!(!err.is_timeout());
    }

    #[test]
    fn driver_timeout_classifies_by_message() {
        let err = ScanError::Driver("browser driver timeout after 60s awaiting audit".to_string());
        assert!(err.is_timeout());
    }

    #[test]
    fn validation_errors_are_flagged() {
        assert!(ScanError::MissingUrl.is_validation());
        assert!(ScanError::InvalidRequest("bad json".into()).is_validation());
        let parse_err = url::Url::parse("not-a-url").unwrap_err();
        assert!(ScanError::InvalidUrl(parse_err).is_validation());
        assert!(!ScanError::Audit("boom".into()).is_validation());
    }

    #[test]
    fn invalid_url_converts_from_parse_error() {
        let err: ScanError = url::Url::parse("not-a-url").unwrap_err().into();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
        assert!(err.to_string().starts_with("Invalid URL"));
    }
}
