use thiserror::Error;

/// Errors raised by the client.
///
/// Only transport, encoding and local validation problems are errors. A
/// response the service answered with a non-success `code` (unknown job id,
/// nothing to export, generation failure) or a document job that ended in
/// the `failure` state is returned as data and must be inspected by the
/// caller.
#[derive(Error, Debug)]
pub enum UmiError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    #[error("{operation} failed: {status}")]
    RequestFailed {
        operation: &'static str,
        status: String,
    },

    #[error("{operation} returned an unexpected body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl UmiError {
    pub(crate) fn request_failed(operation: &'static str, status: impl Into<String>) -> Self {
        UmiError::RequestFailed {
            operation,
            status: status.into(),
        }
    }

    /// True for failures that happened before or while talking to the
    /// service (as opposed to local encoding or validation problems).
    pub fn is_request_failure(&self) -> bool {
        matches!(self, UmiError::RequestFailed { .. } | UmiError::Decode { .. })
    }
}

pub type Result<T> = std::result::Result<T, UmiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display_carries_status() {
        let err = UmiError::request_failed("docUpload", "500 Internal Server Error");
        assert_eq!(err.to_string(), "docUpload failed: 500 Internal Server Error");
        assert!(err.is_request_failure());
    }

    #[test]
    fn test_validation_is_not_request_failure() {
        let err = UmiError::Validation("bad factor".to_string());
        assert!(!err.is_request_failure());
    }
}
