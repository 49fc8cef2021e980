//! Internal error types for datadock-client.

use datadock_core::{ErrorKind, message};
use reqwest::StatusCode;
use thiserror::Error;

/// Internal error type for HTTP transport and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Token file could not be read.
    #[error("Token file error: {0}")]
    TokenFile(#[from] std::io::Error),
}

impl From<Error> for datadock_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    datadock_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    datadock_core::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    datadock_core::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    datadock_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => datadock_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::TokenFile(e) => datadock_core::Error::configuration()
                .with_message(format!("Cannot read API token file: {e}"))
                .with_source(e),
        }
    }
}

/// Maps an HTTP failure status to an error kind.
pub(crate) fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::InvalidInput,
        StatusCode::CONFLICT => ErrorKind::InvalidState,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        s if s.is_server_error() => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::ExternalError,
    }
}

/// Builds the error for a non-2xx response body.
pub(crate) fn from_response(status: StatusCode, body: &str) -> datadock_core::Error {
    datadock_core::Error::new(kind_for_status(status))
        .with_message(message::normalize_error(status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(kind_for_status(StatusCode::UNAUTHORIZED), ErrorKind::Authentication);
        assert_eq!(kind_for_status(StatusCode::FORBIDDEN), ErrorKind::Authorization);
        assert_eq!(kind_for_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(
            kind_for_status(StatusCode::UNPROCESSABLE_ENTITY),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            kind_for_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimited
        );
        assert_eq!(
            kind_for_status(StatusCode::BAD_GATEWAY),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(kind_for_status(StatusCode::IM_A_TEAPOT), ErrorKind::ExternalError);
    }

    #[test]
    fn test_response_error_carries_normalized_message() {
        let err = from_response(StatusCode::NOT_FOUND, r#"{"detail": "Connection not found"}"#);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message.as_deref(), Some("Connection not found"));
        assert!(!err.is_retryable());

        let err = from_response(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.is_retryable());
        assert_eq!(
            err.message.as_deref(),
            Some("Request failed with status 503")
        );
    }

    #[test]
    fn test_token_file_errors_are_configuration_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: datadock_core::Error = Error::from(io).into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
